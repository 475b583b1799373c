//! Cachama API crate - axum HTTP server for the chat relay.
//!
//! Serves the streaming chat endpoint, the persona-themed chat page, a health
//! check, and static assets (dish photos) for every other path.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
