// handlers/elevated/mod.rs - Elevated handlers (platform ADMIN only)
//
// Routes here sit behind the JWT middleware and the ManagePlans capability.

pub mod plans;
