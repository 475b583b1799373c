use thiserror::Error;

/// Top-level error type for the Cachama system.
///
/// Subsystem crates define their own error types and implement
/// `From<CachamaError>` so that `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CachamaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for CachamaError {
    fn from(err: toml::de::Error) -> Self {
        CachamaError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CachamaError {
    fn from(err: toml::ser::Error) -> Self {
        CachamaError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CachamaError {
    fn from(err: serde_json::Error) -> Self {
        CachamaError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Cachama operations.
pub type Result<T> = std::result::Result<T, CachamaError>;
