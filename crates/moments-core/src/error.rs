//! Error types for moments-core

use thiserror::Error;

/// Result type alias using moments-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in moments-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// The access credential was rejected by the provider (expired/revoked).
    /// Callers must clear the session and return to the auth screen.
    #[error("Access credential rejected: {0}")]
    Unauthorized(String),

    /// Network or provider outage; the operation may succeed if retried
    /// later, but is never retried internally.
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// The provider returned a payload that cannot be parsed into the
    /// expected shape. A contract error, not a user error.
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// Invalid input, rejected before any remote call is attempted
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Local device store error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Map a transport-level reqwest failure into the gateway taxonomy.
    ///
    /// Status-code handling happens at the call site; this covers failures
    /// where no HTTP response was produced at all.
    pub fn from_transport(error: &reqwest::Error) -> Self {
        Self::RemoteUnavailable(error.to_string())
    }
}
