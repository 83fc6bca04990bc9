// handlers/mod.rs - Three-tier handler layout
//
// Public (no auth) -> Protected (bearer token) -> Elevated (platform ADMIN).
// Route wiring lives in `app.rs`; each tier only exposes handler functions.

pub mod elevated;
pub mod protected;
pub mod public;
