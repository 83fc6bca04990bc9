pub mod auth;
pub mod permissions;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use permissions::{has_capability, require_capability, Capability};
pub use response::{ApiResponse, ApiResult};
