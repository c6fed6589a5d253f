//! Common error types for startup-time loading

use thiserror::Error;

/// Common result type for IVI loading operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading configuration or the media catalog
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog file missing or not decodable
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
