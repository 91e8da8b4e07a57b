//! Cryptographic primitives for the HCS DID method.
//!
//! Wraps Ed25519 signing with strong types and defines the [`Signer`] seam
//! used by envelopes and transactions.

use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier, VerifyingKey};
use std::fmt;

use crate::codec;
use crate::error::DidError;

/// A 32-byte Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey(pub [u8; 32]);

impl Ed25519PublicKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Multibase (base58btc) form with the ed25519-pub multicodec prefix.
    pub fn to_multibase(&self) -> String {
        codec::encode_public_key(&self.0)
    }

    /// Parse the multibase form produced by [`Self::to_multibase`].
    pub fn from_multibase(s: &str) -> Result<Self, DidError> {
        codec::decode_public_key(s).map(Self)
    }

    /// Verify a signature over a message.
    pub fn verify(&self, message: &[u8], signature: &Ed25519Signature) -> Result<(), DidError> {
        let verifying_key = VerifyingKey::from_bytes(&self.0)
            .map_err(|e| DidError::InvalidPublicKey(e.to_string()))?;

        let sig = Signature::from_bytes(&signature.0);

        verifying_key
            .verify(message, &sig)
            .map_err(|_| DidError::InvalidSignature)
    }
}

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Pub({})", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Ed25519PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Ed25519PublicKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Signature(pub [u8; 64]);

impl Ed25519Signature {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Base64 form carried in envelopes.
    pub fn to_base64(&self) -> String {
        codec::base64_encode(&self.0)
    }

    /// Parse the base64 envelope form.
    pub fn from_base64(s: &str) -> Result<Self, DidError> {
        let bytes = codec::base64_decode(s)?;
        let arr: [u8; 64] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| DidError::Decoding(format!("signature is {} bytes", bytes.len())))?;
        Ok(Self(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Sig({}...)", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Ed25519Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 64]> for Ed25519Signature {
    fn from(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }
}

/// Something that can sign DID messages.
///
/// Envelopes and transactions only see this trait, so keys held in an HSM or
/// a remote wallet plug in the same way as a local [`Keypair`].
pub trait Signer: Send + Sync {
    /// Sign the given bytes.
    fn sign(&self, message: &[u8]) -> Ed25519Signature;

    /// The public half of the signing key.
    fn public_key(&self) -> Ed25519PublicKey;

    /// Verify a signature made by this signer.
    fn verify(&self, message: &[u8], signature: &Ed25519Signature) -> bool {
        self.public_key().verify(message, signature).is_ok()
    }
}

/// A local Ed25519 keypair.
///
/// This wraps ed25519-dalek's SigningKey.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::generate(&mut rng);
        Self { signing_key }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Get the raw seed bytes (secret key material).
    pub fn seed(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl Signer for Keypair {
    fn sign(&self, message: &[u8]) -> Ed25519Signature {
        let sig = self.signing_key.sign(message);
        Ed25519Signature(sig.to_bytes())
    }

    fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_sign_verify() {
        let keypair = Keypair::generate();
        let message = b"hello world";
        let signature = keypair.sign(message);

        keypair
            .public_key()
            .verify(message, &signature)
            .expect("valid signature should verify");
        assert!(keypair.verify(message, &signature));

        // Tampered message should fail
        assert!(keypair.public_key().verify(b"hello worlD", &signature).is_err());
    }

    #[test]
    fn test_keypair_deterministic_from_seed() {
        let seed = [0x42u8; 32];
        let kp1 = Keypair::from_seed(&seed);
        let kp2 = Keypair::from_seed(&seed);
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.seed(), seed);
    }

    #[test]
    fn test_public_key_multibase_roundtrip() {
        let pk = Keypair::generate().public_key();
        let encoded = pk.to_multibase();
        assert!(encoded.starts_with("z6Mk"));
        assert_eq!(Ed25519PublicKey::from_multibase(&encoded).unwrap(), pk);
    }

    #[test]
    fn test_signature_base64_roundtrip() {
        let keypair = Keypair::from_seed(&[7u8; 32]);
        let sig = keypair.sign(b"payload");
        let recovered = Ed25519Signature::from_base64(&sig.to_base64()).unwrap();
        assert_eq!(sig, recovered);

        assert!(Ed25519Signature::from_base64("AAAA").is_err());
    }
}
