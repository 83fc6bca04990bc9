pub mod admin;
pub mod migrate;
pub mod plan;
pub mod serve;
pub mod tenant;
