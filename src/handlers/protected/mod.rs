// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Every handler here runs behind the JWT middleware and reads the caller
// from `AuthUser`. Tenant ids always come from the token, never the body.

pub mod billing;
pub mod cart;
pub mod customers;
pub mod discounts;
pub mod orders;
pub mod products;
pub mod subscriptions;
pub mod tenants;
pub mod users;
