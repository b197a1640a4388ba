//! Parley API crate - axum HTTP surface over the chat dispatcher.
//!
//! Exposes the chat endpoint, conversation history reads, the model list,
//! and a health check, with uniform JSON error bodies.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
