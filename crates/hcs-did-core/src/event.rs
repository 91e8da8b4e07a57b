//! DID events: the payload of every message on a DID topic.
//!
//! An event is one variant of [`DidEvent`]. On the wire it is a JSON object
//! with a single key naming the event target (`DIDOwner`, `Service`,
//! `VerificationMethod`, `VerificationRelationship`) whose value holds the
//! event fields, base64-encoded inside the message.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::codec;
use crate::crypto::Ed25519PublicKey;
use crate::error::{DidError, Result};
use crate::types::DidOperation;
use crate::validation::{require_non_empty, validate_event_id, EventIdKind};

/// The part of a DID document an event targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    DidOwner,
    Service,
    VerificationMethod,
    VerificationRelationship,
    Document,
}

impl EventTarget {
    /// Top-level JSON key of the event.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventTarget::DidOwner => "DIDOwner",
            EventTarget::Service => "Service",
            EventTarget::VerificationMethod => "VerificationMethod",
            EventTarget::VerificationRelationship => "VerificationRelationship",
            EventTarget::Document => "Document",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "DIDOwner" => Some(EventTarget::DidOwner),
            "Service" => Some(EventTarget::Service),
            "VerificationMethod" => Some(EventTarget::VerificationMethod),
            "VerificationRelationship" => Some(EventTarget::VerificationRelationship),
            "Document" => Some(EventTarget::Document),
            _ => None,
        }
    }
}

impl fmt::Display for EventTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported verification key type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    #[default]
    Ed25519VerificationKey2018,
}

/// Supported service type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    LinkedDomains,
    #[serde(rename = "DIDCommMessaging")]
    DidCommMessaging,
}

/// Purpose a verification method is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipType {
    Authentication,
    AssertionMethod,
    KeyAgreement,
    CapabilityInvocation,
    CapabilityDelegation,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 5] = [
        RelationshipType::Authentication,
        RelationshipType::AssertionMethod,
        RelationshipType::KeyAgreement,
        RelationshipType::CapabilityInvocation,
        RelationshipType::CapabilityDelegation,
    ];

    /// Document key of the relationship list.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Authentication => "authentication",
            RelationshipType::AssertionMethod => "assertionMethod",
            RelationshipType::KeyAgreement => "keyAgreement",
            RelationshipType::CapabilityInvocation => "capabilityInvocation",
            RelationshipType::CapabilityDelegation => "capabilityDelegation",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Event definitions
// ─────────────────────────────────────────────────────────────────────────────

/// The DID root key: `id`, `type`, `controller`, `publicKeyMultibase`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerDef {
    pub id: String,
    #[serde(rename = "type")]
    pub key_type: KeyType,
    pub controller: String,
    #[serde(rename = "publicKeyMultibase", with = "codec::multibase_key")]
    pub public_key: Ed25519PublicKey,
}

impl OwnerDef {
    pub fn new(
        id: impl Into<String>,
        controller: impl Into<String>,
        public_key: Ed25519PublicKey,
    ) -> Result<Self> {
        let def = Self {
            id: id.into(),
            key_type: KeyType::default(),
            controller: controller.into(),
            public_key,
        };
        def.validate()?;
        Ok(def)
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("id", &self.id)?;
        require_non_empty("controller", &self.controller)?;
        validate_event_id(&self.id, EventIdKind::RootKey)
    }
}

/// A service endpoint: `id`, `type`, `serviceEndpoint`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDef {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub service_endpoint: String,
}

impl ServiceDef {
    pub fn new(
        id: impl Into<String>,
        service_type: ServiceType,
        service_endpoint: impl Into<String>,
    ) -> Result<Self> {
        let def = Self {
            id: id.into(),
            service_type,
            service_endpoint: service_endpoint.into(),
        };
        def.validate()?;
        Ok(def)
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("id", &self.id)?;
        require_non_empty("serviceEndpoint", &self.service_endpoint)?;
        validate_event_id(&self.id, EventIdKind::Service)
    }
}

/// A named public key: `id`, `type`, `controller`, `publicKeyMultibase`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationMethodDef {
    pub id: String,
    #[serde(rename = "type")]
    pub key_type: KeyType,
    pub controller: String,
    #[serde(rename = "publicKeyMultibase", with = "codec::multibase_key")]
    pub public_key: Ed25519PublicKey,
}

impl VerificationMethodDef {
    pub fn new(
        id: impl Into<String>,
        controller: impl Into<String>,
        public_key: Ed25519PublicKey,
    ) -> Result<Self> {
        let def = Self {
            id: id.into(),
            key_type: KeyType::default(),
            controller: controller.into(),
            public_key,
        };
        def.validate()?;
        Ok(def)
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("id", &self.id)?;
        require_non_empty("controller", &self.controller)?;
        validate_event_id(&self.id, EventIdKind::Key)
    }
}

/// A key bound to a relationship:
/// `id`, `relationshipType`, `type`, `controller`, `publicKeyMultibase`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRelationshipDef {
    pub id: String,
    pub relationship_type: RelationshipType,
    #[serde(rename = "type")]
    pub key_type: KeyType,
    pub controller: String,
    #[serde(rename = "publicKeyMultibase", with = "codec::multibase_key")]
    pub public_key: Ed25519PublicKey,
}

impl VerificationRelationshipDef {
    pub fn new(
        id: impl Into<String>,
        relationship_type: RelationshipType,
        controller: impl Into<String>,
        public_key: Ed25519PublicKey,
    ) -> Result<Self> {
        let def = Self {
            id: id.into(),
            relationship_type,
            key_type: KeyType::default(),
            controller: controller.into(),
            public_key,
        };
        def.validate()?;
        Ok(def)
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("id", &self.id)?;
        require_non_empty("controller", &self.controller)?;
        validate_event_id(&self.id, EventIdKind::Key)
    }
}

/// Reference to a service or verification method being revoked: `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeDef {
    pub id: String,
}

impl RevokeDef {
    pub fn service(id: impl Into<String>) -> Result<Self> {
        let def = Self { id: id.into() };
        def.validate(EventIdKind::Service)?;
        Ok(def)
    }

    pub fn verification_method(id: impl Into<String>) -> Result<Self> {
        let def = Self { id: id.into() };
        def.validate(EventIdKind::Key)?;
        Ok(def)
    }

    fn validate(&self, kind: EventIdKind) -> Result<()> {
        require_non_empty("id", &self.id)?;
        validate_event_id(&self.id, kind)
    }
}

/// Reference to a relationship binding being revoked: `id`, `relationshipType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeRelationshipDef {
    pub id: String,
    pub relationship_type: RelationshipType,
}

impl RevokeRelationshipDef {
    pub fn new(id: impl Into<String>, relationship_type: RelationshipType) -> Result<Self> {
        let def = Self {
            id: id.into(),
            relationship_type,
        };
        def.validate()?;
        Ok(def)
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("id", &self.id)?;
        validate_event_id(&self.id, EventIdKind::Key)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DidEvent
// ─────────────────────────────────────────────────────────────────────────────

/// Every event that can appear on a DID topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DidEvent {
    CreateOwner(OwnerDef),
    UpdateOwner(OwnerDef),
    CreateService(ServiceDef),
    UpdateService(ServiceDef),
    RevokeService(RevokeDef),
    CreateVerificationMethod(VerificationMethodDef),
    UpdateVerificationMethod(VerificationMethodDef),
    RevokeVerificationMethod(RevokeDef),
    CreateVerificationRelationship(VerificationRelationshipDef),
    UpdateVerificationRelationship(VerificationRelationshipDef),
    RevokeVerificationRelationship(RevokeRelationshipDef),
    DeleteDocument,
}

impl DidEvent {
    /// Operation a message carrying this event must declare.
    pub fn operation(&self) -> DidOperation {
        match self {
            DidEvent::CreateOwner(_)
            | DidEvent::CreateService(_)
            | DidEvent::CreateVerificationMethod(_)
            | DidEvent::CreateVerificationRelationship(_) => DidOperation::Create,
            DidEvent::UpdateOwner(_)
            | DidEvent::UpdateService(_)
            | DidEvent::UpdateVerificationMethod(_)
            | DidEvent::UpdateVerificationRelationship(_) => DidOperation::Update,
            DidEvent::RevokeService(_)
            | DidEvent::RevokeVerificationMethod(_)
            | DidEvent::RevokeVerificationRelationship(_) => DidOperation::Revoke,
            DidEvent::DeleteDocument => DidOperation::Delete,
        }
    }

    pub fn target(&self) -> EventTarget {
        match self {
            DidEvent::CreateOwner(_) | DidEvent::UpdateOwner(_) => EventTarget::DidOwner,
            DidEvent::CreateService(_) | DidEvent::UpdateService(_) | DidEvent::RevokeService(_) => {
                EventTarget::Service
            }
            DidEvent::CreateVerificationMethod(_)
            | DidEvent::UpdateVerificationMethod(_)
            | DidEvent::RevokeVerificationMethod(_) => EventTarget::VerificationMethod,
            DidEvent::CreateVerificationRelationship(_)
            | DidEvent::UpdateVerificationRelationship(_)
            | DidEvent::RevokeVerificationRelationship(_) => EventTarget::VerificationRelationship,
            DidEvent::DeleteDocument => EventTarget::Document,
        }
    }

    /// The event id, or `None` for a document delete.
    pub fn id(&self) -> Option<&str> {
        match self {
            DidEvent::CreateOwner(d) | DidEvent::UpdateOwner(d) => Some(&d.id),
            DidEvent::CreateService(d) | DidEvent::UpdateService(d) => Some(&d.id),
            DidEvent::RevokeService(d) | DidEvent::RevokeVerificationMethod(d) => Some(&d.id),
            DidEvent::CreateVerificationMethod(d) | DidEvent::UpdateVerificationMethod(d) => {
                Some(&d.id)
            }
            DidEvent::CreateVerificationRelationship(d)
            | DidEvent::UpdateVerificationRelationship(d) => Some(&d.id),
            DidEvent::RevokeVerificationRelationship(d) => Some(&d.id),
            DidEvent::DeleteDocument => None,
        }
    }

    /// Check the id pattern and required fields.
    pub fn validate(&self) -> Result<()> {
        match self {
            DidEvent::CreateOwner(d) | DidEvent::UpdateOwner(d) => d.validate(),
            DidEvent::CreateService(d) | DidEvent::UpdateService(d) => d.validate(),
            DidEvent::RevokeService(d) => d.validate(EventIdKind::Service),
            DidEvent::CreateVerificationMethod(d) | DidEvent::UpdateVerificationMethod(d) => {
                d.validate()
            }
            DidEvent::RevokeVerificationMethod(d) => d.validate(EventIdKind::Key),
            DidEvent::CreateVerificationRelationship(d)
            | DidEvent::UpdateVerificationRelationship(d) => d.validate(),
            DidEvent::RevokeVerificationRelationship(d) => d.validate(),
            DidEvent::DeleteDocument => Ok(()),
        }
    }

    /// The event fields in wire order. Empty for a document delete.
    pub fn canonical_fields(&self) -> Result<Map<String, Value>> {
        let value = match self {
            DidEvent::CreateOwner(d) | DidEvent::UpdateOwner(d) => serde_json::to_value(d)?,
            DidEvent::CreateService(d) | DidEvent::UpdateService(d) => serde_json::to_value(d)?,
            DidEvent::RevokeService(d) | DidEvent::RevokeVerificationMethod(d) => {
                serde_json::to_value(d)?
            }
            DidEvent::CreateVerificationMethod(d) | DidEvent::UpdateVerificationMethod(d) => {
                serde_json::to_value(d)?
            }
            DidEvent::CreateVerificationRelationship(d)
            | DidEvent::UpdateVerificationRelationship(d) => serde_json::to_value(d)?,
            DidEvent::RevokeVerificationRelationship(d) => serde_json::to_value(d)?,
            DidEvent::DeleteDocument => return Ok(Map::new()),
        };

        match value {
            Value::Object(map) => Ok(map),
            other => Err(DidError::Encoding(format!(
                "event fields serialized to {}",
                other
            ))),
        }
    }

    /// `{"<target>": {fields}}`, or `Null` for a document delete.
    pub fn to_json_tree(&self) -> Result<Value> {
        if matches!(self, DidEvent::DeleteDocument) {
            return Ok(Value::Null);
        }

        let mut wrapper = Map::new();
        wrapper.insert(
            self.target().as_str().to_string(),
            Value::Object(self.canonical_fields()?),
        );
        Ok(Value::Object(wrapper))
    }

    /// Compact JSON form. Empty for a document delete.
    pub fn to_json(&self) -> Result<String> {
        match self.to_json_tree()? {
            Value::Null => Ok(String::new()),
            tree => Ok(serde_json::to_string(&tree)?),
        }
    }

    /// Base64 of [`Self::to_json`]. Empty for a document delete.
    pub fn to_base64(&self) -> Result<String> {
        let json = self.to_json()?;
        if json.is_empty() {
            return Ok(String::new());
        }
        Ok(codec::base64_encode(json))
    }

    /// Parse an event carried by a message with the given operation.
    ///
    /// Anything that does not decode to a known `(operation, target)` pair
    /// yields `None`; callers ignore such messages.
    pub fn from_base64(operation: DidOperation, payload: &str) -> Option<Self> {
        if operation == DidOperation::Delete {
            return Some(DidEvent::DeleteDocument);
        }

        match Self::decode(operation, payload) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::debug!("ignoring unparseable {} event: {}", operation, e);
                None
            }
        }
    }

    fn decode(operation: DidOperation, payload: &str) -> Result<Self> {
        let bytes = codec::base64_decode(payload)?;
        let tree: Value = serde_json::from_slice(&bytes)?;

        let Value::Object(mut wrapper) = tree else {
            return Err(DidError::InvalidEvent("event is not a JSON object".into()));
        };
        if wrapper.len() != 1 {
            return Err(DidError::InvalidEvent(format!(
                "event must have exactly one target, found {}",
                wrapper.len()
            )));
        }

        let name = wrapper.keys().next().cloned().unwrap_or_default();
        let fields = wrapper.remove(&name).unwrap_or(Value::Null);
        let target = EventTarget::from_name(&name)
            .ok_or_else(|| DidError::InvalidEvent(format!("unknown event target {}", name)))?;

        let event = Self::dispatch(operation, target, fields)?;
        event.validate()?;
        Ok(event)
    }

    fn dispatch(operation: DidOperation, target: EventTarget, fields: Value) -> Result<Self> {
        use DidOperation::*;
        use EventTarget::*;

        Ok(match (operation, target) {
            (Create, DidOwner) => DidEvent::CreateOwner(from_fields(fields)?),
            (Create, Service) => DidEvent::CreateService(from_fields(fields)?),
            (Create, VerificationMethod) => DidEvent::CreateVerificationMethod(from_fields(fields)?),
            (Create, VerificationRelationship) => {
                DidEvent::CreateVerificationRelationship(from_fields(fields)?)
            }
            (Update, DidOwner) => DidEvent::UpdateOwner(from_fields(fields)?),
            (Update, Service) => DidEvent::UpdateService(from_fields(fields)?),
            (Update, VerificationMethod) => DidEvent::UpdateVerificationMethod(from_fields(fields)?),
            (Update, VerificationRelationship) => {
                DidEvent::UpdateVerificationRelationship(from_fields(fields)?)
            }
            (Revoke, Service) => DidEvent::RevokeService(from_fields(fields)?),
            (Revoke, VerificationMethod) => DidEvent::RevokeVerificationMethod(from_fields(fields)?),
            (Revoke, VerificationRelationship) => {
                DidEvent::RevokeVerificationRelationship(from_fields(fields)?)
            }
            (Delete, _) => DidEvent::DeleteDocument,
            (op, target) => {
                return Err(DidError::InvalidEvent(format!(
                    "no {} event for target {}",
                    op, target
                )))
            }
        })
    }
}

fn from_fields<T: DeserializeOwned>(fields: Value) -> Result<T> {
    serde_json::from_value(fields).map_err(|e| DidError::InvalidEvent(e.to_string()))
}
