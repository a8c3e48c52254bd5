//! Server-rendered dashboard over the correspondence API.
//!
//! Pages are axum handlers rendering minijinja templates. Every protected
//! route runs behind [`session::require_session`], which turns the session
//! cookie into a [`session::Session`] carrying an authenticated API client.

pub mod auth;
pub mod cartas;
pub mod catalogs;
pub mod dashboard;
pub mod error;
pub mod files;
pub mod forms;
pub mod router;
pub mod session;
pub mod state;
pub mod views;

pub use error::WebError;
pub use router::build_router;
pub use state::{AppState, SharedState, WebConfig};
