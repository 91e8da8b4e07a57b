//! Byte-level codecs used on the wire.
//!
//! Keys travel as multibase (base58btc) strings carrying the ed25519-pub
//! multicodec prefix; events and signatures travel as standard base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use multibase::Base;

use crate::error::{DidError, Result};

/// Multicodec prefix for an ed25519 public key.
pub const ED25519_PUB_PREFIX: [u8; 2] = [0xed, 0x01];

/// Encode a raw ed25519 public key as `z6Mk...`.
pub fn encode_public_key(key: &[u8; 32]) -> String {
    let mut bytes = Vec::with_capacity(ED25519_PUB_PREFIX.len() + key.len());
    bytes.extend_from_slice(&ED25519_PUB_PREFIX);
    bytes.extend_from_slice(key);
    multibase::encode(Base::Base58Btc, bytes)
}

/// Decode a multibase public key. The multicodec prefix is optional.
pub fn decode_public_key(s: &str) -> Result<[u8; 32]> {
    let (_, bytes) =
        multibase::decode(s).map_err(|e| DidError::InvalidPublicKey(e.to_string()))?;

    let raw = bytes.strip_prefix(&ED25519_PUB_PREFIX[..]).unwrap_or(&bytes);

    raw.try_into().map_err(|_| {
        DidError::InvalidPublicKey(format!("expected 32 key bytes, got {}", raw.len()))
    })
}

pub fn base64_encode(bytes: impl AsRef<[u8]>) -> String {
    STANDARD.encode(bytes)
}

pub fn base64_decode(s: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(s)
        .map_err(|e| DidError::Decoding(e.to_string()))
}

/// Serde adapter storing an [`Ed25519PublicKey`](crate::crypto::Ed25519PublicKey)
/// as `publicKeyMultibase`.
pub(crate) mod multibase_key {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::crypto::Ed25519PublicKey;

    pub fn serialize<S: Serializer>(key: &Ed25519PublicKey, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&key.to_multibase())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Ed25519PublicKey, D::Error> {
        let s = String::deserialize(d)?;
        Ed25519PublicKey::from_multibase(&s).map_err(serde::de::Error::custom)
    }
}
