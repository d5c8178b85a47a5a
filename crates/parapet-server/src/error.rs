//! Error types for the Parapet server
//!
//! This module contains the error types used throughout the server.

use parapet_core::EngineError;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Unauthorized error
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    InternalError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

impl From<EngineError> for ServerError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Authentication(msg) => ServerError::Unauthorized(msg),
            EngineError::NotFound(what) => ServerError::NotFound(what),
            EngineError::Validation(msg) => ServerError::ValidationError(msg),
            other => ServerError::InternalError(other.to_string()),
        }
    }
}
