//! # HCS DID Core
//!
//! Pure primitives for the `did:hedera` method: identifiers, events, signed
//! message envelopes and document replay.
//!
//! This crate contains no I/O and no networking. A DID document is never
//! stored; it is rebuilt by folding the messages of its consensus topic.
//!
//! ## Key Types
//!
//! - [`HcsDid`] - Parsed `did:hedera:<network>:<idString>_<topicId>` identifier
//! - [`DidEvent`] - One change to a document (owner, service, key, relationship, delete)
//! - [`DidMessage`] - Timestamped operation carrying an event
//! - [`MessageEnvelope`] - Signed wrapper around a message
//! - [`DidDocument`] - Result of replaying messages in consensus order
//!
//! ## Replay
//!
//! ```rust,no_run
//! use hcs_did_core::{DidDocument, DidMessage};
//!
//! fn resolve(did: &str, messages: &[DidMessage]) -> String {
//!     let document = DidDocument::reduce(did, messages);
//!     document.to_json().unwrap_or_default()
//! }
//! ```

pub mod codec;
pub mod crypto;
pub mod did;
pub mod document;
pub mod envelope;
pub mod error;
pub mod event;
pub mod message;
pub mod types;
pub mod validation;

pub use crypto::{Ed25519PublicKey, Ed25519Signature, Keypair, Signer};
pub use did::HcsDid;
pub use document::{
    ApplyResult, DeletePolicy, DidDocument, DocumentOptions, MethodDef, SkipReason,
    DID_DOCUMENT_CONTEXT,
};
pub use envelope::{ArrivalMetadata, EnvelopePayload, MessageEnvelope};
pub use error::{DidError, DidErrorCode, Result};
pub use event::{
    DidEvent, EventTarget, KeyType, OwnerDef, RelationshipType, RevokeDef, RevokeRelationshipDef,
    ServiceDef, ServiceType, VerificationMethodDef, VerificationRelationshipDef,
};
pub use message::DidMessage;
pub use types::{DidOperation, Network, TopicId, TransactionId};
