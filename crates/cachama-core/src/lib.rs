//! Cachama Core crate - shared types, configuration, and error handling.

pub mod config;
pub mod error;
pub mod types;

pub use config::CachamaConfig;
pub use error::{CachamaError, Result};
pub use types::*;
