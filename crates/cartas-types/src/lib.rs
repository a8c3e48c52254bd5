pub mod api;
pub mod inputs;
pub mod models;

/// Identifier used by every resource of the correspondence API.
pub type Id = i64;
