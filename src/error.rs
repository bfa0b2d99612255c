//! Error types for telebridge.

use thiserror::Error;

pub use crate::provider::EngineError;

/// Result type alias using the telebridge error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error, fatal at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure from the model backend
    #[error(transparent)]
    Engine(#[from] EngineError),
}
