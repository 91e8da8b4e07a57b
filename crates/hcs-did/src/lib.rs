//! # HCS DID
//!
//! The `did:hedera` method: DID documents kept as signed event logs on a
//! Hedera consensus topic.
//!
//! ## Overview
//!
//! A document is never stored. Each change is published as a signed message
//! to the DID's topic, and resolution replays the topic in consensus order:
//!
//! - **Register**: publish the root key (`#did-root-key`)
//! - **Resolve**: read the topic until it goes quiet, verify and replay
//! - **Change owner / delete**: hand over or deactivate the document
//! - **Services, keys, relationships**: add, update and revoke entries
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hcs_did::{DidClient, DidConfig, Keypair, MemoryLedger, Network, ServiceType, TopicId};
//!
//! async fn example() -> hcs_did::Result<()> {
//!     let ledger = MemoryLedger::new();
//!     let keypair = Arc::new(Keypair::generate());
//!
//!     let mut client = DidClient::with_topic(
//!         Network::Testnet,
//!         TopicId::new(0, 0, 1234),
//!         keypair,
//!         Some(ledger),
//!         DidConfig::default(),
//!     );
//!     client.register().await?;
//!
//!     let did = client.identifier().map(|d| d.to_string()).unwrap_or_default();
//!     client
//!         .add_service(&format!("{}#service-1", did), ServiceType::LinkedDomains, "https://example.com")
//!         .await?;
//!
//!     let document = client.resolve().await?;
//!     println!("{}", document.to_json()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `hcs_did::core` - Identifiers, events, envelopes and document replay
//! - `hcs_did::sync` - Gateway, listener, resolver and transactions

pub mod client;
pub mod error;

pub use hcs_did_core as core;
pub use hcs_did_sync as sync;

pub use client::{DidClient, DidConfig};
pub use error::{Error, Result};

pub use hcs_did_core::{
    DeletePolicy, DidDocument, DidErrorCode, DidEvent, DidMessage, DocumentOptions,
    Ed25519PublicKey, HcsDid, Keypair, MessageEnvelope, Network, RelationshipType, ServiceType,
    Signer, TopicId,
};
pub use hcs_did_sync::{LedgerGateway, MemoryLedger, ResolverConfig, TransactionReceipt};
