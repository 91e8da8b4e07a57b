//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use bytes::Bytes;
use chrono::{DateTime, Duration, TimeZone, Utc};

use hcs_did_core::{
    DidEvent, DidMessage, Ed25519PublicKey, HcsDid, Keypair, MessageEnvelope, Network, OwnerDef,
    RelationshipType, RevokeDef, RevokeRelationshipDef, ServiceDef, ServiceType, Signer, TopicId,
    VerificationMethodDef, VerificationRelationshipDef,
};
use hcs_did_sync::{MemoryLedger, TopicMessage};

/// A DID owned by one keypair, with helpers to build its events.
pub struct DidFixture {
    pub keypair: Keypair,
    pub topic_id: TopicId,
    pub did: HcsDid,
}

impl DidFixture {
    /// Create a new fixture with a random keypair on topic `0.0.2`.
    pub fn new() -> Self {
        Self::from_keypair(Keypair::generate(), TopicId::new(0, 0, 2))
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self::from_keypair(Keypair::from_seed(&seed), TopicId::new(0, 0, 2))
    }

    /// The same owner key on another topic.
    pub fn on_topic(&self, topic_id: TopicId) -> Self {
        Self::from_keypair(self.keypair.clone(), topic_id)
    }

    fn from_keypair(keypair: Keypair, topic_id: TopicId) -> Self {
        let did = HcsDid::from_public_key(Network::Testnet, &keypair.public_key(), Some(topic_id));
        Self {
            keypair,
            topic_id,
            did,
        }
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        self.keypair.public_key()
    }

    pub fn did_string(&self) -> String {
        self.did.to_string()
    }

    pub fn root_key_id(&self) -> String {
        self.did.root_key_id()
    }

    pub fn service_id(&self, n: u32) -> String {
        format!("{}#service-{}", self.did, n)
    }

    pub fn key_id(&self, n: u32) -> String {
        format!("{}#key-{}", self.did, n)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────────────────────

    pub fn create_owner(&self) -> DidEvent {
        DidEvent::CreateOwner(self.owner_def(self.public_key()))
    }

    pub fn update_owner(&self, public_key: Ed25519PublicKey) -> DidEvent {
        DidEvent::UpdateOwner(self.owner_def(public_key))
    }

    fn owner_def(&self, public_key: Ed25519PublicKey) -> OwnerDef {
        OwnerDef {
            id: self.root_key_id(),
            key_type: Default::default(),
            controller: self.did_string(),
            public_key,
        }
    }

    pub fn create_service(&self, n: u32, endpoint: &str) -> DidEvent {
        DidEvent::CreateService(self.service_def(n, endpoint))
    }

    pub fn update_service(&self, n: u32, endpoint: &str) -> DidEvent {
        DidEvent::UpdateService(self.service_def(n, endpoint))
    }

    fn service_def(&self, n: u32, endpoint: &str) -> ServiceDef {
        ServiceDef {
            id: self.service_id(n),
            service_type: ServiceType::LinkedDomains,
            service_endpoint: endpoint.to_string(),
        }
    }

    pub fn revoke_service(&self, n: u32) -> DidEvent {
        DidEvent::RevokeService(RevokeDef {
            id: self.service_id(n),
        })
    }

    pub fn create_method(&self, n: u32, public_key: Ed25519PublicKey) -> DidEvent {
        DidEvent::CreateVerificationMethod(self.method_def(n, public_key))
    }

    pub fn update_method(&self, n: u32, public_key: Ed25519PublicKey) -> DidEvent {
        DidEvent::UpdateVerificationMethod(self.method_def(n, public_key))
    }

    fn method_def(&self, n: u32, public_key: Ed25519PublicKey) -> VerificationMethodDef {
        VerificationMethodDef {
            id: self.key_id(n),
            key_type: Default::default(),
            controller: self.did_string(),
            public_key,
        }
    }

    pub fn revoke_method(&self, n: u32) -> DidEvent {
        DidEvent::RevokeVerificationMethod(RevokeDef { id: self.key_id(n) })
    }

    pub fn create_relationship(
        &self,
        n: u32,
        relationship_type: RelationshipType,
        public_key: Ed25519PublicKey,
    ) -> DidEvent {
        DidEvent::CreateVerificationRelationship(self.relationship_def(n, relationship_type, public_key))
    }

    pub fn update_relationship(
        &self,
        n: u32,
        relationship_type: RelationshipType,
        public_key: Ed25519PublicKey,
    ) -> DidEvent {
        DidEvent::UpdateVerificationRelationship(self.relationship_def(n, relationship_type, public_key))
    }

    fn relationship_def(
        &self,
        n: u32,
        relationship_type: RelationshipType,
        public_key: Ed25519PublicKey,
    ) -> VerificationRelationshipDef {
        VerificationRelationshipDef {
            id: self.key_id(n),
            relationship_type,
            key_type: Default::default(),
            controller: self.did_string(),
            public_key,
        }
    }

    pub fn revoke_relationship(&self, n: u32, relationship_type: RelationshipType) -> DidEvent {
        DidEvent::RevokeVerificationRelationship(RevokeRelationshipDef {
            id: self.key_id(n),
            relationship_type,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Messages and envelopes
    // ─────────────────────────────────────────────────────────────────────────

    /// A message stamped `offset_secs` after [`base_time`].
    pub fn message(&self, event: DidEvent, offset_secs: i64) -> DidMessage {
        DidMessage::new(self.did_string(), event).with_timestamp(base_time() + Duration::seconds(offset_secs))
    }

    /// Messages for `events`, one second apart.
    pub fn messages(&self, events: Vec<DidEvent>) -> Vec<DidMessage> {
        events
            .into_iter()
            .enumerate()
            .map(|(i, event)| self.message(event, i as i64))
            .collect()
    }

    /// A message signed by this fixture's key.
    pub fn signed(&self, message: DidMessage) -> MessageEnvelope<DidMessage> {
        let mut envelope = MessageEnvelope::new(message);
        // Signing a fresh envelope with a present signer cannot fail.
        let _ = envelope.sign(Some(&self.keypair));
        envelope
    }

    /// Wire bytes of a signed message, as they would sit on the topic.
    pub fn signed_bytes(&self, message: DidMessage) -> Bytes {
        let envelope = self.signed(message);
        Bytes::from(envelope.to_json().unwrap_or_default())
    }

    /// Append signed messages to the fixture's topic.
    pub async fn publish_all(&self, ledger: &MemoryLedger, messages: Vec<DidMessage>) -> Vec<TopicMessage> {
        let mut appended = Vec::with_capacity(messages.len());
        for message in messages {
            appended.push(ledger.append(&self.topic_id, self.signed_bytes(message)).await);
        }
        appended
    }
}

impl Default for DidFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// The fixed instant fixture messages are stamped relative to: 2022-03-04T10:20:30Z.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 3, 4, 10, 20, 30)
        .single()
        .unwrap_or_default()
}

/// Create multiple fixtures for multi-party tests.
pub fn multi_party_fixtures(count: usize) -> Vec<DidFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            DidFixture::with_seed(seed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcs_did_core::DidDocument;
    use hcs_did_sync::{EventMessageResolver, ResolverConfig};

    #[test]
    fn test_fixture_events_are_valid() {
        let fixture = DidFixture::with_seed([7u8; 32]);
        let key = fixture.public_key();

        for event in [
            fixture.create_owner(),
            fixture.update_owner(key),
            fixture.create_service(1, "https://example.com"),
            fixture.revoke_service(1),
            fixture.create_method(1, key),
            fixture.revoke_method(1),
            fixture.create_relationship(2, RelationshipType::KeyAgreement, key),
            fixture.revoke_relationship(2, RelationshipType::KeyAgreement),
        ] {
            assert!(event.validate().is_ok(), "{:?}", event);
        }
    }

    #[test]
    fn test_signed_envelope_verifies() {
        let fixture = DidFixture::with_seed([7u8; 32]);
        let envelope = fixture.signed(fixture.message(fixture.create_owner(), 0));
        assert!(envelope.verify(|_| Some(fixture.public_key())));
    }

    #[test]
    fn test_multi_party() {
        let parties = multi_party_fixtures(3);

        let dids: Vec<_> = parties.iter().map(|p| p.did_string()).collect();
        assert_ne!(dids[0], dids[1]);
        assert_ne!(dids[1], dids[2]);
        assert_ne!(dids[0], dids[2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_published_messages_resolve() {
        let fixture = DidFixture::with_seed([7u8; 32]);
        let ledger = MemoryLedger::new();
        let messages = fixture.messages(vec![
            fixture.create_owner(),
            fixture.create_service(1, "https://example.com"),
        ]);
        fixture.publish_all(&ledger, messages).await;

        let envelopes = EventMessageResolver::new(fixture.topic_id, ResolverConfig::default())
            .execute(ledger.as_ref())
            .await
            .unwrap();

        let messages: Vec<_> = envelopes.into_iter().filter_map(|e| e.into_message()).collect();
        let document = DidDocument::reduce(fixture.did_string(), &messages);
        assert_eq!(document.services().len(), 1);
    }
}
