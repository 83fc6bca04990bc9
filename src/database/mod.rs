pub mod manager;
pub mod memory;
pub mod postgres;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager, DatabaseResult};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{
    BillingStore, CartStore, CustomerStore, DiscountStore, HealthCheck, OrderStore, ProductStore,
    Stores, SubscriptionStore, TenantStore, UserStore,
};
