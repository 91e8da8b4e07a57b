//! Error types for the client.

use hcs_did_core::{DidError, DidErrorCode};
use hcs_did_sync::SyncError;
use thiserror::Error;

/// Errors that can occur during client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Identifier, event or envelope error.
    #[error(transparent)]
    Did(#[from] DidError),

    /// Listener, resolver or transaction error.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Missing configuration or an operation not allowed in the current state.
    #[error("{0}")]
    Client(String),

    /// Resolution did not finish in time.
    #[error("timeout: {0}")]
    Timeout(String),
}

impl Error {
    pub(crate) fn client(message: impl Into<String>) -> Self {
        Error::Client(message.into())
    }

    /// The machine-readable code for this error.
    pub fn code(&self) -> DidErrorCode {
        match self {
            Error::Did(e) => e.code(),
            Error::Sync(e) => e.code(),
            Error::Client(_) => DidErrorCode::Generic,
            Error::Timeout(_) => DidErrorCode::Timeout,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
