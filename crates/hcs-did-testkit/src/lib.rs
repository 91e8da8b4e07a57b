//! # HCS DID Testkit
//!
//! Testing utilities for the HCS DID crates.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Document vectors**: Message sequences with their exact expected document JSON
//! - **Generators**: Proptest strategies for events, keys and identifiers
//! - **Fixtures**: A seeded DID with helpers to build, sign and publish its events
//!
//! ## Document Vectors
//!
//! ```rust
//! use hcs_did_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, json) in verify_all_vectors() {
//!     println!("{}: {} {}", name, matches, json);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use hcs_did_core::DidEvent;
//! use hcs_did_testkit::{generators::did_event, DidFixture};
//!
//! proptest! {
//!     #[test]
//!     fn event_round_trips(event in did_event(&DidFixture::with_seed([1; 32]))) {
//!         let encoded = event.to_base64().unwrap();
//!         prop_assert_eq!(DidEvent::from_base64(event.operation(), &encoded), Some(event));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use hcs_did_testkit::fixtures::DidFixture;
//!
//! let fixture = DidFixture::new();
//! let message = fixture.message(fixture.create_owner(), 0);
//! let envelope = fixture.signed(message);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{base_time, multi_party_fixtures, DidFixture};
pub use generators::{did_event, non_owner_event};
pub use vectors::{all_vectors, reduce_vector, verify_all_vectors, DocumentVector};
