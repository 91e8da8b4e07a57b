//! Document vectors: message sequences with their expected JSON projection.
//!
//! Each vector replays a fixed sequence for a seeded DID and states the exact
//! document JSON, key order included.

use serde_json::{json, Value};

use hcs_did_core::{
    DidDocument, DidEvent, DidMessage, Keypair, RelationshipType, Signer, DID_DOCUMENT_CONTEXT,
};

use crate::fixtures::DidFixture;

/// Seed of the DID every vector is built for.
pub const VECTOR_SEED: &str = "4242424242424242424242424242424242424242424242424242424242424242";

/// Seed of the extra key used by vectors that add methods.
pub const SECOND_KEY_SEED: [u8; 32] = [0x09; 32];

/// A document vector.
#[derive(Debug, Clone)]
pub struct DocumentVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// The DID the document is resolved for.
    pub did: String,
    /// Messages in consensus order.
    pub messages: Vec<DidMessage>,
    /// Expected projection.
    pub expected: Value,
    /// Expected deactivation flag.
    pub deactivated: bool,
}

/// The fixture all vectors share.
pub fn vector_fixture() -> DidFixture {
    let mut seed = [0u8; 32];
    if let Ok(bytes) = hex::decode(VECTOR_SEED) {
        seed.copy_from_slice(&bytes);
    }
    DidFixture::with_seed(seed)
}

/// Get all document vectors.
pub fn all_vectors() -> Vec<DocumentVector> {
    let f = vector_fixture();
    let did = f.did_string();
    let root = f.root_key_id();
    let owner_key = f.public_key().to_multibase();
    let second = Keypair::from_seed(&SECOND_KEY_SEED).public_key();

    let empty = json!({
        "@context": DID_DOCUMENT_CONTEXT,
        "id": did,
        "verificationMethod": [],
        "assertionMethod": [],
        "authentication": [],
    });

    let owner_only = json!({
        "@context": DID_DOCUMENT_CONTEXT,
        "id": did,
        "verificationMethod": [{
            "id": root,
            "type": "Ed25519VerificationKey2018",
            "controller": did,
            "publicKeyMultibase": owner_key,
        }],
        "assertionMethod": [root],
        "authentication": [root],
    });

    vec![
        DocumentVector {
            name: "empty topic",
            did: did.clone(),
            messages: vec![],
            expected: empty.clone(),
            deactivated: false,
        },
        DocumentVector {
            name: "owner then delete",
            did: did.clone(),
            messages: f.messages(vec![f.create_owner(), DidEvent::DeleteDocument]),
            expected: empty.clone(),
            deactivated: true,
        },
        DocumentVector {
            name: "orphaned relationship key is removed",
            did: did.clone(),
            messages: f.messages(vec![
                f.create_owner(),
                f.create_relationship(2, RelationshipType::CapabilityDelegation, second),
                f.revoke_relationship(2, RelationshipType::CapabilityDelegation),
            ]),
            expected: owner_only.clone(),
            deactivated: false,
        },
        DocumentVector {
            name: "events before the owner are ignored",
            did: did.clone(),
            messages: f.messages(vec![
                f.create_service(1, "https://example.com"),
                f.create_method(1, second),
            ]),
            expected: empty,
            deactivated: false,
        },
        DocumentVector {
            name: "full document",
            did: did.clone(),
            messages: f.messages(vec![
                f.create_owner(),
                f.create_service(1, "https://example.com/vcs"),
                f.create_method(1, second),
                f.create_relationship(3, RelationshipType::Authentication, second),
                f.create_relationship(4, RelationshipType::KeyAgreement, second),
            ]),
            expected: json!({
                "@context": DID_DOCUMENT_CONTEXT,
                "id": did,
                "verificationMethod": [
                    {
                        "id": root,
                        "type": "Ed25519VerificationKey2018",
                        "controller": did,
                        "publicKeyMultibase": owner_key,
                    },
                    {
                        "id": f.key_id(1),
                        "type": "Ed25519VerificationKey2018",
                        "controller": did,
                        "publicKeyMultibase": second.to_multibase(),
                    },
                    {
                        "id": f.key_id(3),
                        "relationshipType": "authentication",
                        "type": "Ed25519VerificationKey2018",
                        "controller": did,
                        "publicKeyMultibase": second.to_multibase(),
                    },
                    {
                        "id": f.key_id(4),
                        "relationshipType": "keyAgreement",
                        "type": "Ed25519VerificationKey2018",
                        "controller": did,
                        "publicKeyMultibase": second.to_multibase(),
                    },
                ],
                "assertionMethod": [root],
                "authentication": [root, f.key_id(3)],
                "keyAgreement": [f.key_id(4)],
                "service": [{
                    "id": f.service_id(1),
                    "type": "LinkedDomains",
                    "serviceEndpoint": "https://example.com/vcs",
                }],
            }),
            deactivated: false,
        },
    ]
}

/// Replay a vector's messages.
pub fn reduce_vector(vector: &DocumentVector) -> DidDocument {
    DidDocument::reduce(vector.did.clone(), &vector.messages)
}

/// Check every vector against the reducer.
///
/// Returns `(name, matches, actual JSON)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let document = reduce_vector(v);
            let actual = document.to_json().unwrap_or_default();
            let expected = serde_json::to_string(&v.expected).unwrap_or_default();
            let matches = actual == expected && document.deactivated() == v.deactivated;

            (v.name.to_string(), matches, actual)
        })
        .collect()
}
