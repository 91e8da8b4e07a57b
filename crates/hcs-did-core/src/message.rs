//! DID messages: a timestamped operation on a DID carrying one event.
//!
//! Wire form: `{"timestamp":..,"operation":..,"did":..,"event":<base64>}`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::did::HcsDid;
use crate::envelope::EnvelopePayload;
use crate::error::{DidError, Result};
use crate::event::DidEvent;
use crate::types::{DidOperation, TopicId};

/// Format an instant the way messages and documents carry it.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse a message timestamp.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DidError::Decoding(format!("invalid timestamp {}: {}", s, e)))
}

/// A message published to a DID topic.
///
/// Any of operation, did and event may be missing on a message read from the
/// wire; such a message is never [valid](Self::is_valid).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DidMessage {
    timestamp: DateTime<Utc>,
    operation: Option<DidOperation>,
    did: Option<String>,
    event: Option<DidEvent>,
}

#[derive(Serialize, Deserialize)]
struct MessageWire {
    timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operation: Option<DidOperation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    did: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    event: Option<String>,
}

impl DidMessage {
    /// A new message stamped now, with the operation the event implies.
    pub fn new(did: impl Into<String>, event: DidEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: Some(event.operation()),
            did: Some(did.into()),
            event: Some(event),
        }
    }

    /// Assemble a message from possibly missing parts.
    pub fn from_parts(
        timestamp: DateTime<Utc>,
        operation: Option<DidOperation>,
        did: Option<String>,
        event: Option<DidEvent>,
    ) -> Self {
        Self {
            timestamp,
            operation,
            did,
            event,
        }
    }

    /// Replace the timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn operation(&self) -> Option<DidOperation> {
        self.operation
    }

    pub fn did(&self) -> Option<&str> {
        self.did.as_deref()
    }

    pub fn event(&self) -> Option<&DidEvent> {
        self.event.as_ref()
    }

    /// Structural validity, optionally scoped to the topic the message was read from.
    pub fn is_valid(&self, scope_topic: Option<&TopicId>) -> bool {
        let (Some(did), Some(_), Some(_)) = (&self.did, &self.operation, &self.event) else {
            return false;
        };

        let Ok(parsed) = HcsDid::parse(did) else {
            return false;
        };

        match (scope_topic, parsed.topic_id()) {
            (Some(scope), Some(own)) => scope == own,
            _ => true,
        }
    }

    pub fn to_json_tree(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.to_wire()?)?)
    }

    /// Compact JSON; these are the bytes an envelope signs.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_wire()?)?)
    }

    pub fn from_json_tree(tree: Value) -> Result<Self> {
        let wire: MessageWire = serde_json::from_value(tree)?;
        Self::from_wire(wire)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let wire: MessageWire = serde_json::from_str(json)?;
        Self::from_wire(wire)
    }

    fn to_wire(&self) -> Result<MessageWire> {
        let event = self.event.as_ref().map(DidEvent::to_base64).transpose()?;
        Ok(MessageWire {
            timestamp: format_timestamp(&self.timestamp),
            operation: self.operation,
            did: self.did.clone(),
            event,
        })
    }

    fn from_wire(wire: MessageWire) -> Result<Self> {
        let timestamp = parse_timestamp(&wire.timestamp)?;
        let event = match (wire.operation, wire.event.as_deref()) {
            (Some(operation), Some(payload)) => DidEvent::from_base64(operation, payload),
            _ => None,
        };

        Ok(Self {
            timestamp,
            operation: wire.operation,
            did: wire.did,
            event,
        })
    }
}

impl EnvelopePayload for DidMessage {
    fn to_json_tree(&self) -> Result<Value> {
        DidMessage::to_json_tree(self)
    }

    fn from_json_tree(tree: Value) -> Result<Self> {
        DidMessage::from_json_tree(tree)
    }
}
