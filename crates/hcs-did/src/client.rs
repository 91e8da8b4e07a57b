//! The DID client: one identifier, its signer and a ledger gateway.
//!
//! Every write builds an event, wraps it in a message and publishes it as a
//! [`DidTransaction`]. Reads resolve the topic and replay it into a
//! [`DidDocument`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use hcs_did_core::{
    DidDocument, DidEvent, DidMessage, DocumentOptions, Ed25519PublicKey, HcsDid, MessageEnvelope,
    Network, OwnerDef, RelationshipType, RevokeDef, RevokeRelationshipDef, ServiceDef, ServiceType,
    Signer, TopicId, VerificationMethodDef, VerificationRelationshipDef,
};
use hcs_did_sync::{
    DidTransaction, EventMessageResolver, LedgerGateway, ResolverConfig, TransactionReceipt,
};

use crate::error::{Error, Result};

/// Configuration for the client.
#[derive(Debug, Clone)]
pub struct DidConfig {
    /// Resolver configuration.
    pub resolver: ResolverConfig,
    /// Upper bound on a whole resolution.
    pub resolve_timeout: Duration,
    /// Upper bound on waiting for a published message to come back.
    pub confirmation_timeout: Duration,
    /// Whether publishing waits for confirmation.
    pub await_confirmation: bool,
    /// Whether resolution drops messages not signed by the owner.
    pub verify_signatures: bool,
    /// Replay options.
    pub document: DocumentOptions,
}

impl Default for DidConfig {
    fn default() -> Self {
        Self {
            resolver: ResolverConfig::default(),
            resolve_timeout: Duration::from_secs(30),
            confirmation_timeout: Duration::from_secs(30),
            await_confirmation: true,
            verify_signatures: true,
            document: DocumentOptions::default(),
        }
    }
}

/// A client for one DID.
///
/// Provides:
/// - Registering a new DID on an existing topic
/// - Resolving the current document
/// - Changing the owner and deleting the document
/// - Managing services, verification methods and relationships
pub struct DidClient {
    identifier: Option<HcsDid>,
    network: Network,
    topic_id: TopicId,
    signer: Option<Arc<dyn Signer>>,
    gateway: Option<Arc<dyn LedgerGateway>>,
    config: DidConfig,
    messages: Vec<DidMessage>,
    document: Option<DidDocument>,
}

impl DidClient {
    /// A client for an existing DID string.
    ///
    /// The signer is needed only for writes; the gateway for anything that
    /// touches the ledger.
    pub fn new(
        identifier: &str,
        signer: Option<Arc<dyn Signer>>,
        gateway: Option<Arc<dyn LedgerGateway>>,
        config: DidConfig,
    ) -> Result<Self> {
        let identifier = HcsDid::parse(identifier)?;
        let topic_id = *identifier.topic_id().ok_or_else(|| {
            hcs_did_core::DidError::InvalidDidString(
                "DID string is invalid: topic ID is missing".into(),
            )
        })?;

        Ok(Self {
            network: identifier.network(),
            identifier: Some(identifier),
            topic_id,
            signer,
            gateway,
            config,
            messages: Vec::new(),
            document: None,
        })
    }

    /// A client that will register a new DID on `topic_id`.
    ///
    /// The identifier is derived from the signer's key on [`register`](Self::register).
    pub fn with_topic(
        network: Network,
        topic_id: TopicId,
        signer: Arc<dyn Signer>,
        gateway: Option<Arc<dyn LedgerGateway>>,
        config: DidConfig,
    ) -> Self {
        Self {
            identifier: None,
            network,
            topic_id,
            signer: Some(signer),
            gateway,
            config,
            messages: Vec::new(),
            document: None,
        }
    }

    pub fn identifier(&self) -> Option<&HcsDid> {
        self.identifier.as_ref()
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn topic_id(&self) -> &TopicId {
        &self.topic_id
    }

    pub fn config(&self) -> &DidConfig {
        &self.config
    }

    /// Public key of the current signer.
    pub fn public_key(&self) -> Option<Ed25519PublicKey> {
        self.signer.as_ref().map(|s| s.public_key())
    }

    /// Messages read by the last resolution, in consensus order.
    pub fn messages(&self) -> &[DidMessage] {
        &self.messages
    }

    /// Document produced by the last resolution.
    pub fn document(&self) -> Option<&DidDocument> {
        self.document.as_ref()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Publish the root key of a new DID.
    ///
    /// An existing identifier is resolved first and must not have an owner yet.
    pub async fn register(&mut self) -> Result<TransactionReceipt> {
        let (signer, _) = self.client_config()?;

        if self.identifier.is_some() {
            let document = self.resolve().await?;
            if document.has_owner() {
                return Err(Error::client("DID is already registered"));
            }
        } else {
            self.identifier = Some(HcsDid::from_public_key(
                self.network,
                &signer.public_key(),
                Some(self.topic_id),
            ));
        }

        let identifier = self.registered()?.clone();
        let event = DidEvent::CreateOwner(OwnerDef::new(
            identifier.root_key_id(),
            identifier.to_string(),
            signer.public_key(),
        )?);

        let receipt = self.publish(event).await?;
        tracing::info!("registered {}", identifier);
        Ok(receipt)
    }

    /// Resolve the topic and replay it into the current document.
    pub async fn resolve(&mut self) -> Result<DidDocument> {
        let identifier = self
            .identifier
            .clone()
            .ok_or_else(|| Error::client("DID is not registered"))?;
        let gateway = self
            .gateway
            .clone()
            .ok_or_else(|| Error::client("Client configuration is missing"))?;

        // Anyone can write to the topic; unreadable items are skipped.
        let topic_id = self.topic_id;
        let resolver = EventMessageResolver::new(self.topic_id, self.config.resolver)
            .for_did(identifier.to_string())
            .on_error(move |e| tracing::warn!("skipping unreadable message on {}: {}", topic_id, e));

        let envelopes = tokio::time::timeout(
            self.config.resolve_timeout,
            resolver.execute(gateway.as_ref()),
        )
        .await
        .map_err(|_| {
            Error::Timeout(format!(
                "resolving {} took longer than {:?}",
                identifier, self.config.resolve_timeout
            ))
        })??;

        let mut document = DidDocument::new(identifier.to_string(), self.config.document);
        let mut messages = Vec::with_capacity(envelopes.len());

        for envelope in &envelopes {
            if self.config.verify_signatures
                && !envelope.verify(|e| signing_key(&document, &identifier, e))
            {
                tracing::warn!(
                    "dropping message #{} for {}: signature does not match the owner key",
                    envelope.arrival().map_or(0, |a| a.sequence_number),
                    identifier
                );
                continue;
            }

            if let Some(message) = envelope.open() {
                document.apply(message);
                messages.push(message.clone());
            }
        }

        self.messages = messages;
        self.document = Some(document.clone());
        Ok(document)
    }

    /// Hand the DID over to a new key.
    ///
    /// The update is signed with the current key; later writes use `new_signer`.
    pub async fn change_owner(
        &mut self,
        controller: &str,
        new_signer: Arc<dyn Signer>,
    ) -> Result<TransactionReceipt> {
        self.client_config()?;
        let identifier = self.registered()?.clone();

        let document = self.resolve().await?;
        if !document.has_owner() {
            return Err(Error::client("DID is not registered"));
        }
        if document.deactivated() {
            return Err(Error::client("DID is deleted"));
        }

        let event = DidEvent::UpdateOwner(OwnerDef::new(
            identifier.root_key_id(),
            controller,
            new_signer.public_key(),
        )?);

        let receipt = self.publish(event).await?;
        self.signer = Some(new_signer);
        Ok(receipt)
    }

    /// Deactivate the document.
    pub async fn delete(&mut self) -> Result<TransactionReceipt> {
        self.publish(DidEvent::DeleteDocument).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Services
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn add_service(
        &mut self,
        id: &str,
        service_type: ServiceType,
        endpoint: &str,
    ) -> Result<TransactionReceipt> {
        let def = ServiceDef::new(id, service_type, endpoint)?;
        self.publish(DidEvent::CreateService(def)).await
    }

    pub async fn update_service(
        &mut self,
        id: &str,
        service_type: ServiceType,
        endpoint: &str,
    ) -> Result<TransactionReceipt> {
        let def = ServiceDef::new(id, service_type, endpoint)?;
        self.publish(DidEvent::UpdateService(def)).await
    }

    pub async fn revoke_service(&mut self, id: &str) -> Result<TransactionReceipt> {
        let def = RevokeDef::service(id)?;
        self.publish(DidEvent::RevokeService(def)).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Verification methods
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn add_verification_method(
        &mut self,
        id: &str,
        controller: &str,
        public_key: Ed25519PublicKey,
    ) -> Result<TransactionReceipt> {
        let def = VerificationMethodDef::new(id, controller, public_key)?;
        self.publish(DidEvent::CreateVerificationMethod(def)).await
    }

    pub async fn update_verification_method(
        &mut self,
        id: &str,
        controller: &str,
        public_key: Ed25519PublicKey,
    ) -> Result<TransactionReceipt> {
        let def = VerificationMethodDef::new(id, controller, public_key)?;
        self.publish(DidEvent::UpdateVerificationMethod(def)).await
    }

    pub async fn revoke_verification_method(&mut self, id: &str) -> Result<TransactionReceipt> {
        let def = RevokeDef::verification_method(id)?;
        self.publish(DidEvent::RevokeVerificationMethod(def)).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Verification relationships
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn add_verification_relationship(
        &mut self,
        id: &str,
        relationship_type: RelationshipType,
        controller: &str,
        public_key: Ed25519PublicKey,
    ) -> Result<TransactionReceipt> {
        let def = VerificationRelationshipDef::new(id, relationship_type, controller, public_key)?;
        self.publish(DidEvent::CreateVerificationRelationship(def)).await
    }

    pub async fn update_verification_relationship(
        &mut self,
        id: &str,
        relationship_type: RelationshipType,
        controller: &str,
        public_key: Ed25519PublicKey,
    ) -> Result<TransactionReceipt> {
        let def = VerificationRelationshipDef::new(id, relationship_type, controller, public_key)?;
        self.publish(DidEvent::UpdateVerificationRelationship(def)).await
    }

    pub async fn revoke_verification_relationship(
        &mut self,
        id: &str,
        relationship_type: RelationshipType,
    ) -> Result<TransactionReceipt> {
        let def = RevokeRelationshipDef::new(id, relationship_type)?;
        self.publish(DidEvent::RevokeVerificationRelationship(def)).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal
    // ─────────────────────────────────────────────────────────────────────────

    fn client_config(&self) -> Result<(Arc<dyn Signer>, Arc<dyn LedgerGateway>)> {
        let signer = self
            .signer
            .clone()
            .ok_or_else(|| Error::client("signer is missing"))?;
        let gateway = self
            .gateway
            .clone()
            .ok_or_else(|| Error::client("Client configuration is missing"))?;
        Ok((signer, gateway))
    }

    fn registered(&self) -> Result<&HcsDid> {
        self.identifier
            .as_ref()
            .ok_or_else(|| Error::client("DID is not registered"))
    }

    async fn publish(&self, event: DidEvent) -> Result<TransactionReceipt> {
        let (signer, gateway) = self.client_config()?;
        let identifier = self.registered()?;

        let message = DidMessage::new(identifier.to_string(), event);
        let mut transaction = DidTransaction::new(MessageEnvelope::new(message), self.topic_id)
            .signer(signer)
            .gateway(gateway);
        if self.config.await_confirmation {
            transaction = transaction.await_confirmation(self.config.confirmation_timeout);
        }

        let receipt = transaction.execute().await?;
        tracing::debug!("published to {} as {}", self.topic_id, receipt.transaction_id);
        Ok(receipt)
    }
}

/// The key a message must be signed with at this point of the replay.
///
/// Before an owner exists, only a `CreateOwner` carrying the key encoded in
/// the identifier can be accepted.
fn signing_key(
    document: &DidDocument,
    identifier: &HcsDid,
    envelope: &MessageEnvelope<DidMessage>,
) -> Option<Ed25519PublicKey> {
    match document.owner() {
        Some(owner) => Some(owner.public_key),
        None => match envelope.open()?.event()? {
            DidEvent::CreateOwner(def) if identifier.public_key().ok() == Some(def.public_key) => {
                Some(def.public_key)
            }
            _ => None,
        },
    }
}

impl fmt::Debug for DidClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DidClient")
            .field("identifier", &self.identifier)
            .field("topic_id", &self.topic_id)
            .field("has_signer", &self.signer.is_some())
            .field("has_gateway", &self.gateway.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcs_did_core::{DidErrorCode, Keypair};
    use hcs_did_sync::MemoryLedger;

    fn fast_config() -> DidConfig {
        DidConfig {
            resolver: ResolverConfig {
                idle_timeout: Duration::from_millis(200),
            },
            ..DidConfig::default()
        }
    }

    #[test]
    fn test_new_requires_topic() {
        let key = Keypair::from_seed(&[1u8; 32]).public_key();
        let did = format!("did:hedera:testnet:{}", key.to_multibase());

        let err = DidClient::new(&did, None, None, DidConfig::default()).unwrap_err();
        assert_eq!(err.code(), DidErrorCode::InvalidDidString);
    }

    #[test]
    fn test_new_rejects_bad_network() {
        let key = Keypair::from_seed(&[1u8; 32]).public_key();
        let did = format!("did:hedera:devnet:{}_0.0.2", key.to_multibase());

        let err = DidClient::new(&did, None, None, DidConfig::default()).unwrap_err();
        assert_eq!(err.code(), DidErrorCode::InvalidNetwork);
    }

    #[tokio::test]
    async fn test_resolve_requires_gateway() {
        let key = Keypair::from_seed(&[1u8; 32]).public_key();
        let did = format!("did:hedera:testnet:{}_0.0.2", key.to_multibase());

        let mut client = DidClient::new(&did, None, None, DidConfig::default()).unwrap();
        let err = client.resolve().await.unwrap_err();
        assert_eq!(err.to_string(), "Client configuration is missing");
        assert_eq!(err.code(), DidErrorCode::Generic);
    }

    #[tokio::test]
    async fn test_resolve_requires_identifier() {
        let signer: Arc<dyn Signer> = Arc::new(Keypair::from_seed(&[1u8; 32]));
        let mut client = DidClient::with_topic(
            Network::Testnet,
            TopicId::new(0, 0, 2),
            signer,
            Some(MemoryLedger::new()),
            DidConfig::default(),
        );

        let err = client.resolve().await.unwrap_err();
        assert_eq!(err.to_string(), "DID is not registered");
    }

    #[tokio::test]
    async fn test_publish_requires_registration() {
        let signer: Arc<dyn Signer> = Arc::new(Keypair::from_seed(&[1u8; 32]));
        let mut client = DidClient::with_topic(
            Network::Testnet,
            TopicId::new(0, 0, 2),
            signer,
            Some(MemoryLedger::new()),
            DidConfig::default(),
        );

        let err = client.delete().await.unwrap_err();
        assert_eq!(err.to_string(), "DID is not registered");
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_derives_identifier() {
        let keypair = Arc::new(Keypair::from_seed(&[1u8; 32]));
        let ledger = MemoryLedger::new();
        let mut client = DidClient::with_topic(
            Network::Testnet,
            TopicId::new(0, 0, 2),
            keypair.clone(),
            Some(ledger.clone()),
            fast_config(),
        );

        client.register().await.unwrap();

        let identifier = client.identifier().unwrap().clone();
        assert_eq!(identifier.public_key().unwrap(), keypair.public_key());
        assert_eq!(identifier.topic_id(), Some(&TopicId::new(0, 0, 2)));

        let document = client.resolve().await.unwrap();
        assert_eq!(document.owner().unwrap().id, identifier.root_key_id());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_drops_messages_signed_by_others() {
        let owner = Arc::new(Keypair::from_seed(&[1u8; 32]));
        let intruder: Arc<dyn Signer> = Arc::new(Keypair::from_seed(&[2u8; 32]));
        let ledger = MemoryLedger::new();

        let mut client = DidClient::with_topic(
            Network::Testnet,
            TopicId::new(0, 0, 2),
            owner,
            Some(ledger.clone()),
            fast_config(),
        );
        client.register().await.unwrap();
        let did = client.identifier().unwrap().to_string();

        let mut rogue = DidClient::new(&did, Some(intruder), Some(ledger.clone()), fast_config()).unwrap();
        rogue
            .add_service(&format!("{}#service-1", did), ServiceType::LinkedDomains, "https://evil.example")
            .await
            .unwrap();

        let document = client.resolve().await.unwrap();
        assert!(document.services().is_empty());
        assert_eq!(client.messages().len(), 1);

        let mut trusting = DidClient::new(
            &did,
            None,
            Some(ledger),
            DidConfig {
                verify_signatures: false,
                ..fast_config()
            },
        )
        .unwrap();
        assert_eq!(trusting.resolve().await.unwrap().services().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_root_key_must_match_identifier() {
        let owner = Arc::new(Keypair::from_seed(&[1u8; 32]));
        let intruder: Arc<dyn Signer> = Arc::new(Keypair::from_seed(&[2u8; 32]));
        let ledger = MemoryLedger::new();
        let did = HcsDid::from_public_key(Network::Testnet, &owner.public_key(), Some(TopicId::new(0, 0, 2)))
            .to_string();

        // Claims the DID first, under its own key.
        let mut rogue = DidClient::new(&did, Some(intruder), Some(ledger.clone()), fast_config()).unwrap();
        rogue.register().await.unwrap();

        let mut client = DidClient::new(&did, Some(owner.clone()), Some(ledger.clone()), fast_config()).unwrap();
        client.register().await.unwrap();

        let document = client.resolve().await.unwrap();
        assert_eq!(document.owner().unwrap().public_key, owner.public_key());
        assert_eq!(client.messages().len(), 1);
        assert_eq!(ledger.messages(&TopicId::new(0, 0, 2)).await.len(), 2);
    }
}
