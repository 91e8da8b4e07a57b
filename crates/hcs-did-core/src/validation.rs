//! Event id and field validation.
//!
//! An event id is `<did>#<fragment>` where the DID part must parse and the
//! fragment must match the pattern for the event's target.

use regex::Regex;
use std::sync::OnceLock;

use crate::did::HcsDid;
use crate::error::{DidError, Result};

/// Fragment pattern an event id must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventIdKind {
    /// `#did-root-key`
    RootKey,
    /// `#service-<n>`
    Service,
    /// `#key-<n>`
    Key,
}

impl EventIdKind {
    fn pattern(&self) -> &'static Regex {
        static ROOT_KEY: OnceLock<Regex> = OnceLock::new();
        static SERVICE: OnceLock<Regex> = OnceLock::new();
        static KEY: OnceLock<Regex> = OnceLock::new();

        match self {
            EventIdKind::RootKey => {
                ROOT_KEY.get_or_init(|| Regex::new(r"^did-root-key$").expect("should compile"))
            }
            EventIdKind::Service => {
                SERVICE.get_or_init(|| Regex::new(r"^service-[0-9]+$").expect("should compile"))
            }
            EventIdKind::Key => {
                KEY.get_or_init(|| Regex::new(r"^key-[0-9]+$").expect("should compile"))
            }
        }
    }

    fn label(&self) -> &'static str {
        match self {
            EventIdKind::RootKey => "#did-root-key",
            EventIdKind::Service => "#service-{integer}",
            EventIdKind::Key => "#key-{integer}",
        }
    }
}

/// Whether `id` is a well-formed event id of the given kind.
pub fn is_valid_event_id(id: &str, kind: EventIdKind) -> bool {
    let mut parts = id.split('#');
    let (Some(did), Some(fragment), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    if did.is_empty() || fragment.is_empty() {
        return false;
    }

    HcsDid::parse(did).is_ok() && kind.pattern().is_match(fragment)
}

/// Fail unless `id` is a well-formed event id of the given kind.
pub fn validate_event_id(id: &str, kind: EventIdKind) -> Result<()> {
    if is_valid_event_id(id, kind) {
        Ok(())
    } else {
        Err(DidError::InvalidEvent(format!(
            "Event ID is invalid. Expected format: {{did}}{}",
            kind.label()
        )))
    }
}

/// Fail if a required field is empty.
pub fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(DidError::InvalidEvent(format!(
            "Validation failed. {} is required",
            field
        )));
    }
    Ok(())
}
