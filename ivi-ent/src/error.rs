//! Error types for ivi-ent
//!
//! Domain errors are `Clone` so a single failure can be fanned out to every
//! subscriber of a live stream.

use thiserror::Error;

/// Main error type for the entertainment core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A state-machine precondition was violated
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Catalog id or named resource absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed command (unknown RPC method, bad parameter)
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    /// Serial worker gone or other internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using ivi-ent Error
pub type Result<T> = std::result::Result<T, Error>;
