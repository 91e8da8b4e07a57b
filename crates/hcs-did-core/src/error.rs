//! Error types for the HCS DID core.

use std::fmt;

use thiserror::Error;

/// Machine-readable error code carried by every DID error.
///
/// Callers branch on the code; the message text is for humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DidErrorCode {
    /// Catch-all for configuration and protocol failures.
    Generic,
    /// The DID string is malformed.
    InvalidDidString,
    /// The DID string names an unsupported network.
    InvalidNetwork,
    /// A bounded wait (resolution or confirmation) expired.
    Timeout,
}

impl DidErrorCode {
    /// Wire label of the code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DidErrorCode::Generic => "GENERIC",
            DidErrorCode::InvalidDidString => "INVALID_DID_STRING",
            DidErrorCode::InvalidNetwork => "INVALID_NETWORK",
            DidErrorCode::Timeout => "TIMEOUT",
        }
    }
}

impl fmt::Display for DidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by identifier parsing, event construction and envelope handling.
#[derive(Debug, Error)]
pub enum DidError {
    #[error("invalid DID string: {0}")]
    InvalidDidString(String),

    #[error("invalid network: {0}")]
    InvalidNetwork(String),

    #[error("invalid topic id: {0}")]
    InvalidTopicId(String),

    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("message is already signed")]
    AlreadySigned,

    #[error("signing function is not provided")]
    MissingSigner,

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("decoding error: {0}")]
    Decoding(String),
}

impl DidError {
    /// The machine-readable code for this error.
    pub fn code(&self) -> DidErrorCode {
        match self {
            DidError::InvalidDidString(_) => DidErrorCode::InvalidDidString,
            DidError::InvalidNetwork(_) => DidErrorCode::InvalidNetwork,
            _ => DidErrorCode::Generic,
        }
    }
}

impl From<serde_json::Error> for DidError {
    fn from(e: serde_json::Error) -> Self {
        DidError::Decoding(e.to_string())
    }
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, DidError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(
            DidError::InvalidDidString("x".into()).code(),
            DidErrorCode::InvalidDidString
        );
        assert_eq!(
            DidError::InvalidNetwork("x".into()).code(),
            DidErrorCode::InvalidNetwork
        );
        assert_eq!(DidError::AlreadySigned.code(), DidErrorCode::Generic);
        assert_eq!(DidErrorCode::Timeout.to_string(), "TIMEOUT");
    }
}
