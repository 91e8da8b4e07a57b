//! Error types for topic listening, resolution and publishing.

use hcs_did_core::{DidError, DidErrorCode};
use thiserror::Error;

/// Errors that can occur while talking to the ledger.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Identifier, event or envelope error.
    #[error(transparent)]
    Did(#[from] DidError),

    /// The gateway failed to submit or subscribe.
    #[error("gateway error: {0}")]
    Gateway(String),

    /// A message read from the topic could not be used.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// A resolver or transaction was not ready to execute.
    #[error("{0}")]
    Validation(String),

    /// Timeout waiting for the topic.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The listener already holds a subscription.
    #[error("listener is already subscribed")]
    AlreadySubscribed,

    /// The subscription was stopped before it finished.
    #[error("subscription cancelled")]
    Cancelled,
}

impl SyncError {
    /// The machine-readable code for this error.
    pub fn code(&self) -> DidErrorCode {
        match self {
            SyncError::Did(e) => e.code(),
            SyncError::Timeout(_) => DidErrorCode::Timeout,
            _ => DidErrorCode::Generic,
        }
    }
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
