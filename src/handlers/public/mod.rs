// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition, store onboarding and read-only catalog endpoints.

pub mod auth;
pub mod plans;
pub mod system;
pub mod tenants;
