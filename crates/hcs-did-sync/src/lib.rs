//! # HCS DID Sync
//!
//! Reading and writing DID messages on a Hedera consensus topic.
//!
//! ## Overview
//!
//! The ledger itself sits behind the [`LedgerGateway`] trait: one call to
//! submit bytes to a topic, one to stream the topic back from a mirror. On
//! top of that this crate provides:
//!
//! - [`TopicListener`] - Filters, parses and validates the mirror feed
//! - [`EventMessageResolver`] - Collects a topic's messages until it goes quiet
//! - [`DidTransaction`] - Signs, submits and confirms one message
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hcs_did_sync::{EventMessageResolver, MemoryLedger, ResolverConfig};
//! use hcs_did_core::TopicId;
//!
//! async fn example() -> hcs_did_sync::Result<()> {
//!     let ledger = MemoryLedger::new();
//!     let topic = TopicId::new(0, 0, 2);
//!
//!     let envelopes = EventMessageResolver::new(topic, ResolverConfig::default())
//!         .execute(ledger.as_ref())
//!         .await?;
//!     println!("{} messages", envelopes.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Message Flow
//!
//! ```text
//! Client                  Gateway                  Mirror
//!   |--- submit(bytes) ----->|                        |
//!   |<-- TransactionId ------|--- consensus order --->|
//!   |<------------------ TopicMessage ----------------|
//!   |   filter -> parse -> validate -> deliver        |
//! ```

pub mod error;
pub mod gateway;
pub mod listener;
pub mod messages;
pub mod resolver;
pub mod transaction;

pub use error::{Result, SyncError};
pub use gateway::{memory::MemoryLedger, LedgerGateway, TopicSubscription};
pub use listener::{
    TopicListener, EMPTY_MESSAGE, EXTRACTION_FAILED, REJECTED_BY_FILTER, VALIDATION_FAILED,
};
pub use messages::{TopicMessage, TopicQuery};
pub use resolver::{EventMessageResolver, ResolverConfig};
pub use transaction::{DidTransaction, TransactionReceipt};
