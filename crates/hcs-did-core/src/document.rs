//! DID documents, rebuilt by replaying a topic's messages.
//!
//! A document starts empty and folds messages in consensus order. Messages
//! that do not apply (no owner yet, duplicate ids, unknown ids, unsupported
//! operation/target pairs) are skipped and logged, never fatal.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::event::{
    DidEvent, OwnerDef, RelationshipType, ServiceDef, VerificationMethodDef,
    VerificationRelationshipDef,
};
use crate::message::{format_timestamp, DidMessage};
use crate::types::DidOperation;

/// JSON-LD context of every document.
pub const DID_DOCUMENT_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

/// What a `DeleteDocument` event means for later messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Clear the document; a later owner CREATE reactivates it.
    #[default]
    Reset,
    /// Clear the document and ignore every later message.
    Terminal,
}

/// Replay options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentOptions {
    pub delete_policy: DeletePolicy,
}

/// A verification method entry. Keys added through a relationship keep
/// their `relationshipType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MethodDef {
    Method(VerificationMethodDef),
    Relationship(VerificationRelationshipDef),
}

impl MethodDef {
    pub fn id(&self) -> &str {
        match self {
            MethodDef::Method(def) => &def.id,
            MethodDef::Relationship(def) => &def.id,
        }
    }
}

/// Why a message was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Operation, did or event missing.
    Incomplete,
    /// Nothing but an owner CREATE applies before an owner exists.
    NoOwner,
    /// The document was deleted under [`DeletePolicy::Terminal`].
    Deactivated,
    /// The id is already present.
    Duplicate,
    /// The id is not present.
    NotFound,
    /// No handler for the operation/target pair.
    Unsupported,
}

/// Result of applying one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyResult {
    Applied,
    Skipped(SkipReason),
}

impl ApplyResult {
    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyResult::Applied)
    }
}

/// A resolved DID document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DidDocument {
    id: String,
    options: DocumentOptions,
    owner: Option<OwnerDef>,
    services: Vec<ServiceDef>,
    verification_methods: Vec<MethodDef>,
    relationships: BTreeMap<RelationshipType, Vec<String>>,
    created: Option<DateTime<Utc>>,
    updated: Option<DateTime<Utc>>,
    version_id: Option<String>,
    deactivated: bool,
}

impl DidDocument {
    /// An empty document for `id`.
    pub fn new(id: impl Into<String>, options: DocumentOptions) -> Self {
        Self {
            id: id.into(),
            options,
            owner: None,
            services: Vec::new(),
            verification_methods: Vec::new(),
            relationships: RelationshipType::ALL
                .iter()
                .map(|t| (*t, Vec::new()))
                .collect(),
            created: None,
            updated: None,
            version_id: None,
            deactivated: false,
        }
    }

    /// Fold `messages` in order into a fresh document.
    pub fn reduce(id: impl Into<String>, messages: &[DidMessage]) -> Self {
        Self::reduce_with(id, messages, DocumentOptions::default())
    }

    pub fn reduce_with(
        id: impl Into<String>,
        messages: &[DidMessage],
        options: DocumentOptions,
    ) -> Self {
        let mut document = Self::new(id, options);
        for message in messages {
            document.apply(message);
        }
        document
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn context(&self) -> &'static str {
        DID_DOCUMENT_CONTEXT
    }

    pub fn owner(&self) -> Option<&OwnerDef> {
        self.owner.as_ref()
    }

    pub fn has_owner(&self) -> bool {
        self.owner.is_some()
    }

    pub fn services(&self) -> &[ServiceDef] {
        &self.services
    }

    pub fn verification_methods(&self) -> &[MethodDef] {
        &self.verification_methods
    }

    /// Ids bound to a relationship, excluding the implicit owner key.
    pub fn relationship(&self, relationship_type: RelationshipType) -> &[String] {
        self.relationships
            .get(&relationship_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    pub fn updated(&self) -> Option<DateTime<Utc>> {
        self.updated
    }

    pub fn version_id(&self) -> Option<&str> {
        self.version_id.as_deref()
    }

    pub fn deactivated(&self) -> bool {
        self.deactivated
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Replay
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply one message.
    pub fn apply(&mut self, message: &DidMessage) -> ApplyResult {
        let result = self.apply_inner(message);
        if let ApplyResult::Skipped(reason) = result {
            let id = message.event().and_then(DidEvent::id).unwrap_or_default();
            match reason {
                SkipReason::NoOwner | SkipReason::Deactivated | SkipReason::Incomplete => {
                    tracing::debug!("skipping message {}: {:?}", id, reason)
                }
                _ => tracing::warn!(
                    "{:?} {:?} event {} ignored: {:?}",
                    message.operation(),
                    message.event().map(DidEvent::target),
                    id,
                    reason
                ),
            }
        }
        result
    }

    fn apply_inner(&mut self, message: &DidMessage) -> ApplyResult {
        let (Some(operation), Some(event)) = (message.operation(), message.event()) else {
            return ApplyResult::Skipped(SkipReason::Incomplete);
        };

        if self.deactivated && self.options.delete_policy == DeletePolicy::Terminal {
            return ApplyResult::Skipped(SkipReason::Deactivated);
        }

        if self.owner.is_none()
            && !matches!((operation, event), (DidOperation::Create, DidEvent::CreateOwner(_)))
        {
            return ApplyResult::Skipped(SkipReason::NoOwner);
        }

        let timestamp = message.timestamp();

        match (operation, event) {
            (DidOperation::Create, DidEvent::CreateOwner(def)) => {
                if self.owner.is_some() {
                    return ApplyResult::Skipped(SkipReason::Duplicate);
                }
                self.set_owner(def, timestamp);
            }
            (DidOperation::Create, DidEvent::CreateService(def)) => {
                if self.service_index(&def.id).is_some() {
                    return ApplyResult::Skipped(SkipReason::Duplicate);
                }
                self.services.push(def.clone());
                self.touch(timestamp);
            }
            (DidOperation::Create, DidEvent::CreateVerificationMethod(def)) => {
                if self.method_index(&def.id).is_some() {
                    return ApplyResult::Skipped(SkipReason::Duplicate);
                }
                self.verification_methods.push(MethodDef::Method(def.clone()));
                self.touch(timestamp);
            }
            (DidOperation::Create, DidEvent::CreateVerificationRelationship(def)) => {
                let list = self.relationships.entry(def.relationship_type).or_default();
                if list.contains(&def.id) {
                    return ApplyResult::Skipped(SkipReason::Duplicate);
                }
                list.push(def.id.clone());

                if self.method_index(&def.id).is_none() {
                    self.verification_methods
                        .push(MethodDef::Relationship(def.clone()));
                }
                self.touch(timestamp);
            }
            (DidOperation::Update, DidEvent::UpdateOwner(def)) => {
                self.set_owner(def, timestamp);
            }
            (DidOperation::Update, DidEvent::UpdateService(def)) => {
                let Some(index) = self.service_index(&def.id) else {
                    return ApplyResult::Skipped(SkipReason::NotFound);
                };
                self.services[index] = def.clone();
                self.touch(timestamp);
            }
            (DidOperation::Update, DidEvent::UpdateVerificationMethod(def)) => {
                let Some(index) = self.method_index(&def.id) else {
                    return ApplyResult::Skipped(SkipReason::NotFound);
                };
                self.verification_methods[index] = MethodDef::Method(def.clone());
                self.touch(timestamp);
            }
            (DidOperation::Update, DidEvent::UpdateVerificationRelationship(def)) => {
                // The type is part of the lookup, so an update cannot move a key
                // between relationships.
                if !self.relationship(def.relationship_type).contains(&def.id) {
                    return ApplyResult::Skipped(SkipReason::NotFound);
                }
                let entry = MethodDef::Relationship(def.clone());
                match self.method_index(&def.id) {
                    Some(index) => self.verification_methods[index] = entry,
                    None => self.verification_methods.push(entry),
                }
                self.touch(timestamp);
            }
            (DidOperation::Revoke, DidEvent::RevokeService(def)) => {
                let Some(index) = self.service_index(&def.id) else {
                    return ApplyResult::Skipped(SkipReason::NotFound);
                };
                self.services.remove(index);
                self.touch(timestamp);
            }
            (DidOperation::Revoke, DidEvent::RevokeVerificationMethod(def)) => {
                let Some(index) = self.method_index(&def.id) else {
                    return ApplyResult::Skipped(SkipReason::NotFound);
                };
                self.verification_methods.remove(index);
                for list in self.relationships.values_mut() {
                    list.retain(|id| id != &def.id);
                }
                self.touch(timestamp);
            }
            (DidOperation::Revoke, DidEvent::RevokeVerificationRelationship(def)) => {
                let list = self.relationships.entry(def.relationship_type).or_default();
                let Some(position) = list.iter().position(|id| id == &def.id) else {
                    return ApplyResult::Skipped(SkipReason::NotFound);
                };
                list.remove(position);

                // Drop the key once no relationship references it.
                let referenced = self.relationships.values().any(|l| l.contains(&def.id));
                if !referenced {
                    if let Some(index) = self.method_index(&def.id) {
                        self.verification_methods.remove(index);
                    }
                }
                self.touch(timestamp);
            }
            (DidOperation::Delete, DidEvent::DeleteDocument) => {
                self.owner = None;
                self.services.clear();
                self.verification_methods.clear();
                for list in self.relationships.values_mut() {
                    list.clear();
                }
                self.created = None;
                self.updated = None;
                self.version_id = None;
                self.deactivated = true;
            }
            _ => return ApplyResult::Skipped(SkipReason::Unsupported),
        }

        ApplyResult::Applied
    }

    fn set_owner(&mut self, def: &OwnerDef, timestamp: DateTime<Utc>) {
        self.owner = Some(def.clone());
        self.created = Some(timestamp);
        self.updated = Some(timestamp);
        self.version_id = Some(format_timestamp(&timestamp));
        self.deactivated = false;
    }

    fn touch(&mut self, timestamp: DateTime<Utc>) {
        self.updated = Some(timestamp);
        self.version_id = Some(format_timestamp(&timestamp));
    }

    fn service_index(&self, id: &str) -> Option<usize> {
        self.services.iter().position(|s| s.id == id)
    }

    fn method_index(&self, id: &str) -> Option<usize> {
        self.verification_methods.iter().position(|m| m.id() == id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Projection
    // ─────────────────────────────────────────────────────────────────────────

    /// The W3C JSON projection of the document.
    pub fn to_json_tree(&self) -> Result<Value> {
        let mut root = Map::new();
        root.insert("@context".into(), Value::from(DID_DOCUMENT_CONTEXT));
        root.insert("id".into(), Value::from(self.id.as_str()));

        if let Some(owner) = &self.owner {
            if owner.controller != self.id {
                root.insert("controller".into(), Value::from(owner.controller.as_str()));
            }
        }

        let mut methods = Vec::with_capacity(self.verification_methods.len() + 1);
        if let Some(owner) = &self.owner {
            methods.push(serde_json::to_value(owner)?);
        }
        for method in &self.verification_methods {
            methods.push(serde_json::to_value(method)?);
        }
        root.insert("verificationMethod".into(), Value::Array(methods));

        for relationship in [RelationshipType::AssertionMethod, RelationshipType::Authentication] {
            root.insert(
                relationship.as_str().into(),
                Value::Array(self.relationship_ids(relationship, true)),
            );
        }

        for relationship in [
            RelationshipType::KeyAgreement,
            RelationshipType::CapabilityInvocation,
            RelationshipType::CapabilityDelegation,
        ] {
            let ids = self.relationship_ids(relationship, false);
            if !ids.is_empty() {
                root.insert(relationship.as_str().into(), Value::Array(ids));
            }
        }

        if !self.services.is_empty() {
            root.insert("service".into(), serde_json::to_value(&self.services)?);
        }

        Ok(Value::Object(root))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_json_tree()?)?)
    }

    fn relationship_ids(&self, relationship: RelationshipType, with_owner: bool) -> Vec<Value> {
        let owner = self
            .owner
            .as_ref()
            .filter(|_| with_owner)
            .map(|o| Value::from(o.id.as_str()));

        owner
            .into_iter()
            .chain(
                self.relationship(relationship)
                    .iter()
                    .map(|id| Value::from(id.as_str())),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Ed25519PublicKey, Keypair, Signer};
    use crate::event::{RevokeDef, RevokeRelationshipDef, ServiceType};
    use chrono::Duration;

    struct Setup {
        did: String,
        key: Ed25519PublicKey,
        clock: DateTime<Utc>,
    }

    impl Setup {
        fn new() -> Self {
            let key = Keypair::from_seed(&[8u8; 32]).public_key();
            Self {
                did: format!("did:hedera:testnet:{}_0.0.29613327", key.to_multibase()),
                key,
                clock: DateTime::parse_from_rfc3339("2022-01-01T00:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc),
            }
        }

        fn msg(&mut self, event: DidEvent) -> DidMessage {
            self.clock += Duration::seconds(1);
            DidMessage::new(&self.did, event).with_timestamp(self.clock)
        }

        fn create_owner(&mut self) -> DidMessage {
            let def = OwnerDef::new(format!("{}#did-root-key", self.did), &self.did, self.key).unwrap();
            self.msg(DidEvent::CreateOwner(def))
        }

        fn service(&self, n: u32) -> ServiceDef {
            ServiceDef::new(
                format!("{}#service-{}", self.did, n),
                ServiceType::LinkedDomains,
                "https://example.com/vcs",
            )
            .unwrap()
        }

        fn method(&self, n: u32) -> VerificationMethodDef {
            VerificationMethodDef::new(format!("{}#key-{}", self.did, n), &self.did, self.key).unwrap()
        }

        fn relationship(&self, n: u32, t: RelationshipType) -> VerificationRelationshipDef {
            VerificationRelationshipDef::new(format!("{}#key-{}", self.did, n), t, &self.did, self.key)
                .unwrap()
        }

        fn empty_json(&self) -> String {
            format!(
                r#"{{"@context":"https://www.w3.org/ns/did/v1","id":"{}","verificationMethod":[],"assertionMethod":[],"authentication":[]}}"#,
                self.did
            )
        }
    }

    #[test]
    fn test_empty_document() {
        let s = Setup::new();
        let doc = DidDocument::reduce(&s.did, &[]);

        assert_eq!(doc.to_json().unwrap(), s.empty_json());
        assert!(doc.created().is_none());
        assert!(doc.updated().is_none());
        assert!(doc.version_id().is_none());
        assert!(!doc.deactivated());
    }

    #[test]
    fn test_owner_then_delete() {
        let mut s = Setup::new();
        let messages = [s.create_owner(), s.msg(DidEvent::DeleteDocument)];
        let doc = DidDocument::reduce(&s.did, &messages);

        assert_eq!(doc.to_json().unwrap(), s.empty_json());
        assert!(doc.deactivated());
        assert!(doc.created().is_none());
        assert!(doc.version_id().is_none());
    }

    #[test]
    fn test_owner_projection() {
        let mut s = Setup::new();
        let owner = s.create_owner();
        let doc = DidDocument::reduce(&s.did, &[owner.clone()]);

        let root = format!("{}#did-root-key", s.did);
        let expected = format!(
            r#"{{"@context":"https://www.w3.org/ns/did/v1","id":"{did}","verificationMethod":[{{"id":"{root}","type":"Ed25519VerificationKey2018","controller":"{did}","publicKeyMultibase":"{pk}"}}],"assertionMethod":["{root}"],"authentication":["{root}"]}}"#,
            did = s.did,
            root = root,
            pk = s.key.to_multibase()
        );
        assert_eq!(doc.to_json().unwrap(), expected);
        assert_eq!(doc.created(), Some(owner.timestamp()));
        assert_eq!(doc.version_id(), Some(format_timestamp(&owner.timestamp()).as_str()));
    }

    #[test]
    fn test_controller_emitted_when_different() {
        let mut s = Setup::new();
        let other = Keypair::from_seed(&[9u8; 32]).public_key();
        let other_did = format!("did:hedera:testnet:{}_0.0.1", other.to_multibase());

        let update = OwnerDef::new(format!("{}#did-root-key", other_did), &other_did, other).unwrap();
        let messages = [s.create_owner(), s.msg(DidEvent::UpdateOwner(update))];
        let doc = DidDocument::reduce(&s.did, &messages);

        let tree = doc.to_json_tree().unwrap();
        assert_eq!(tree["controller"], Value::from(other_did.as_str()));
        assert_eq!(
            tree["verificationMethod"][0]["id"],
            Value::from(format!("{}#did-root-key", other_did))
        );
        assert_eq!(doc.created(), Some(messages[1].timestamp()));
    }

    #[test]
    fn test_gate_drops_everything_before_owner() {
        let mut s = Setup::new();
        let service = s.service(1);
        let messages = [
            s.msg(DidEvent::CreateService(service)),
            s.msg(DidEvent::DeleteDocument),
            s.msg(DidEvent::CreateVerificationMethod(s.method(1))),
        ];
        let mut doc = DidDocument::new(&s.did, DocumentOptions::default());
        for message in &messages {
            assert_eq!(doc.apply(message), ApplyResult::Skipped(SkipReason::NoOwner));
        }

        assert_eq!(doc.to_json().unwrap(), s.empty_json());
        assert!(!doc.deactivated());
    }

    #[test]
    fn test_duplicate_create_is_idempotent() {
        let mut s = Setup::new();
        let owner = s.create_owner();
        let service = s.msg(DidEvent::CreateService(s.service(1)));

        let once = DidDocument::reduce(&s.did, &[owner.clone(), service.clone()]);
        let twice = DidDocument::reduce(&s.did, &[owner.clone(), service.clone(), service, owner]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_service_lifecycle() {
        let mut s = Setup::new();
        let owner = s.create_owner();
        let create = s.msg(DidEvent::CreateService(s.service(1)));
        let mut updated = s.service(1);
        updated.service_endpoint = "https://example.com/updated".into();
        let update = s.msg(DidEvent::UpdateService(updated));
        let revoke =
            s.msg(DidEvent::RevokeService(RevokeDef::service(format!("{}#service-1", s.did)).unwrap()));

        let doc = DidDocument::reduce(&s.did, &[owner.clone(), create.clone(), update.clone()]);
        assert_eq!(doc.services().len(), 1);
        assert_eq!(doc.services()[0].service_endpoint, "https://example.com/updated");
        assert_eq!(doc.updated(), Some(update.timestamp()));
        assert_eq!(doc.created(), Some(owner.timestamp()));

        let doc = DidDocument::reduce(&s.did, &[owner, create, update, revoke]);
        assert!(doc.services().is_empty());
        assert!(doc.to_json_tree().unwrap().get("service").is_none());
    }

    #[test]
    fn test_revoke_before_create_is_noop() {
        let mut s = Setup::new();
        let owner = s.create_owner();
        let revoke =
            s.msg(DidEvent::RevokeService(RevokeDef::service(format!("{}#service-1", s.did)).unwrap()));
        let create = s.msg(DidEvent::CreateService(s.service(1)));

        let mut doc = DidDocument::new(&s.did, DocumentOptions::default());
        doc.apply(&owner);
        assert_eq!(doc.apply(&revoke), ApplyResult::Skipped(SkipReason::NotFound));
        assert!(doc.apply(&create).is_applied());
        assert_eq!(doc.services().len(), 1);
    }

    #[test]
    fn test_update_unknown_is_skipped() {
        let mut s = Setup::new();
        let owner = s.create_owner();
        let update = s.msg(DidEvent::UpdateVerificationMethod(s.method(4)));

        let mut doc = DidDocument::new(&s.did, DocumentOptions::default());
        doc.apply(&owner);
        assert_eq!(doc.apply(&update), ApplyResult::Skipped(SkipReason::NotFound));
    }

    #[test]
    fn test_relationship_orphan_cleanup() {
        let mut s = Setup::new();
        let key_id = format!("{}#key-2", s.did);
        let messages = [
            s.create_owner(),
            s.msg(DidEvent::CreateVerificationRelationship(
                s.relationship(2, RelationshipType::CapabilityDelegation),
            )),
        ];

        let doc = DidDocument::reduce(&s.did, &messages);
        let tree = doc.to_json_tree().unwrap();
        assert_eq!(tree["capabilityDelegation"], serde_json::json!([key_id]));
        assert_eq!(
            tree["verificationMethod"][1]["relationshipType"],
            Value::from("capabilityDelegation")
        );

        let revoke = s.msg(DidEvent::RevokeVerificationRelationship(
            RevokeRelationshipDef::new(&key_id, RelationshipType::CapabilityDelegation).unwrap(),
        ));
        let mut all = messages.to_vec();
        all.push(revoke);

        let doc = DidDocument::reduce(&s.did, &all);
        let tree = doc.to_json_tree().unwrap();
        assert!(tree.get("capabilityDelegation").is_none());
        assert_eq!(tree["verificationMethod"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_shared_key_survives_partial_revoke() {
        let mut s = Setup::new();
        let key_id = format!("{}#key-3", s.did);
        let messages = [
            s.create_owner(),
            s.msg(DidEvent::CreateVerificationRelationship(
                s.relationship(3, RelationshipType::KeyAgreement),
            )),
            s.msg(DidEvent::CreateVerificationRelationship(
                s.relationship(3, RelationshipType::CapabilityInvocation),
            )),
            s.msg(DidEvent::RevokeVerificationRelationship(
                RevokeRelationshipDef::new(&key_id, RelationshipType::KeyAgreement).unwrap(),
            )),
        ];

        let doc = DidDocument::reduce(&s.did, &messages);
        assert!(doc.relationship(RelationshipType::KeyAgreement).is_empty());
        assert_eq!(doc.relationship(RelationshipType::CapabilityInvocation), [key_id.clone()]);
        assert_eq!(doc.verification_methods().len(), 1);
        assert_eq!(doc.verification_methods()[0].id(), key_id);
    }

    #[test]
    fn test_revoke_method_purges_relationships() {
        let mut s = Setup::new();
        let key_id = format!("{}#key-1", s.did);
        let messages = [
            s.create_owner(),
            s.msg(DidEvent::CreateVerificationRelationship(
                s.relationship(1, RelationshipType::Authentication),
            )),
            s.msg(DidEvent::RevokeVerificationMethod(
                RevokeDef::verification_method(&key_id).unwrap(),
            )),
        ];

        let doc = DidDocument::reduce(&s.did, &messages);
        assert!(doc.relationship(RelationshipType::Authentication).is_empty());
        assert!(doc.verification_methods().is_empty());
        // Only the owner key remains in authentication.
        assert_eq!(doc.to_json_tree().unwrap()["authentication"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_update_relationship_cannot_change_type() {
        let mut s = Setup::new();
        let owner = s.create_owner();
        let create = s.msg(DidEvent::CreateVerificationRelationship(
            s.relationship(1, RelationshipType::Authentication),
        ));
        let moved = s.msg(DidEvent::UpdateVerificationRelationship(
            s.relationship(1, RelationshipType::KeyAgreement),
        ));

        let mut doc = DidDocument::new(&s.did, DocumentOptions::default());
        doc.apply(&owner);
        doc.apply(&create);
        assert_eq!(doc.apply(&moved), ApplyResult::Skipped(SkipReason::NotFound));
        assert!(doc.relationship(RelationshipType::KeyAgreement).is_empty());

        let mut same_type = s.relationship(1, RelationshipType::Authentication);
        same_type.public_key = Keypair::from_seed(&[2u8; 32]).public_key();
        let update = s.msg(DidEvent::UpdateVerificationRelationship(same_type.clone()));
        assert!(doc.apply(&update).is_applied());
        assert_eq!(
            doc.verification_methods()[0],
            MethodDef::Relationship(same_type)
        );
    }

    #[test]
    fn test_delete_then_recreate_under_reset_policy() {
        let mut s = Setup::new();
        let messages = [s.create_owner(), s.msg(DidEvent::DeleteDocument), s.create_owner()];

        let doc = DidDocument::reduce(&s.did, &messages);
        assert!(doc.has_owner());
        assert!(!doc.deactivated());
        assert_eq!(doc.created(), Some(messages[2].timestamp()));
    }

    #[test]
    fn test_delete_is_final_under_terminal_policy() {
        let mut s = Setup::new();
        let messages = [s.create_owner(), s.msg(DidEvent::DeleteDocument), s.create_owner()];
        let options = DocumentOptions {
            delete_policy: DeletePolicy::Terminal,
        };

        let doc = DidDocument::reduce_with(&s.did, &messages, options);
        assert!(!doc.has_owner());
        assert!(doc.deactivated());
        assert_eq!(doc.to_json().unwrap(), s.empty_json());
    }

    #[test]
    fn test_mismatched_operation_is_unsupported() {
        let mut s = Setup::new();
        let owner = s.create_owner();
        let ts = s.clock;
        let odd = DidMessage::from_parts(
            ts,
            Some(DidOperation::Revoke),
            Some(s.did.clone()),
            Some(DidEvent::CreateService(s.service(1))),
        );

        let mut doc = DidDocument::new(&s.did, DocumentOptions::default());
        doc.apply(&owner);
        assert_eq!(doc.apply(&odd), ApplyResult::Skipped(SkipReason::Unsupported));
    }

    #[test]
    fn test_full_projection_order() {
        let mut s = Setup::new();
        let messages = [
            s.create_owner(),
            s.msg(DidEvent::CreateService(s.service(1))),
            s.msg(DidEvent::CreateVerificationMethod(s.method(1))),
            s.msg(DidEvent::CreateVerificationRelationship(
                s.relationship(2, RelationshipType::KeyAgreement),
            )),
        ];

        let doc = DidDocument::reduce(&s.did, &messages);
        let tree = doc.to_json_tree().unwrap();
        let keys: Vec<&str> = tree.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            [
                "@context",
                "id",
                "verificationMethod",
                "assertionMethod",
                "authentication",
                "keyAgreement",
                "service"
            ]
        );
        assert_eq!(tree["verificationMethod"].as_array().unwrap().len(), 3);
    }
}
