//! Signed message envelopes.
//!
//! An envelope wraps one message together with an Ed25519 signature over the
//! message's compact JSON. Wire form: `{"message":{..},"signature":"<base64>"}`.
//!
//! ## Signing
//!
//! ```rust,no_run
//! use hcs_did_core::{DidEvent, DidMessage, Keypair, MessageEnvelope};
//!
//! # fn demo(did: &str, event: DidEvent) -> hcs_did_core::Result<()> {
//! let keypair = Keypair::generate();
//! let mut envelope = MessageEnvelope::new(DidMessage::new(did, event));
//! let bytes = envelope.sign(Some(&keypair))?;
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::crypto::{Ed25519PublicKey, Ed25519Signature, Signer};
use crate::error::{DidError, Result};

/// A message type that can travel inside an envelope.
pub trait EnvelopePayload: Sized {
    fn to_json_tree(&self) -> Result<Value>;

    fn from_json_tree(tree: Value) -> Result<Self>;
}

/// Where and when the ledger placed a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrivalMetadata {
    pub consensus_timestamp: DateTime<Utc>,
    pub sequence_number: u64,
}

/// A message plus its optional signature and arrival metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEnvelope<M> {
    message: Option<M>,
    signature: Option<String>,
    arrival: Option<ArrivalMetadata>,
}

impl<M: EnvelopePayload> MessageEnvelope<M> {
    /// Wrap an unsigned message.
    pub fn new(message: M) -> Self {
        Self {
            message: Some(message),
            signature: None,
            arrival: None,
        }
    }

    /// The wrapped message, if one was present on the wire.
    pub fn open(&self) -> Option<&M> {
        self.message.as_ref()
    }

    pub fn into_message(self) -> Option<M> {
        self.message
    }

    /// Base64 signature, if signed.
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    pub fn arrival(&self) -> Option<&ArrivalMetadata> {
        self.arrival.as_ref()
    }

    /// Bytes covered by the signature: the message's compact JSON.
    pub fn message_bytes(&self) -> Result<Vec<u8>> {
        let message = self
            .message
            .as_ref()
            .ok_or_else(|| DidError::Encoding("envelope has no message".into()))?;
        Ok(serde_json::to_vec(&message.to_json_tree()?)?)
    }

    /// Sign the message once and return the envelope's JSON bytes.
    pub fn sign(&mut self, signer: Option<&dyn Signer>) -> Result<Vec<u8>> {
        let signer = signer.ok_or(DidError::MissingSigner)?;
        if self.signature.is_some() {
            return Err(DidError::AlreadySigned);
        }

        let signature = signer.sign(&self.message_bytes()?);
        self.signature = Some(signature.to_base64());

        Ok(self.to_json()?.into_bytes())
    }

    /// Verify the signature against the key `resolve_key` picks for this envelope.
    ///
    /// The resolver sees the whole envelope because the right key depends on
    /// context, e.g. which owner was current when the message was published.
    pub fn verify<F>(&self, resolve_key: F) -> bool
    where
        F: FnOnce(&Self) -> Option<Ed25519PublicKey>,
    {
        let Some(signature) = self.signature.as_deref() else {
            return false;
        };
        if self.message.is_none() {
            return false;
        }

        let Some(public_key) = resolve_key(self) else {
            return false;
        };

        let (Ok(signature), Ok(bytes)) =
            (Ed25519Signature::from_base64(signature), self.message_bytes())
        else {
            return false;
        };

        public_key.verify(&bytes, &signature).is_ok()
    }

    pub fn to_json_tree(&self) -> Result<Value> {
        let mut root = Map::new();
        if let Some(message) = &self.message {
            root.insert("message".into(), message.to_json_tree()?);
        }
        if let Some(signature) = &self.signature {
            root.insert("signature".into(), Value::String(signature.clone()));
        }
        Ok(Value::Object(root))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_json_tree()?)?)
    }

    /// Parse an envelope. A missing `message` field yields an envelope with no message.
    pub fn from_json(json: &str) -> Result<Self> {
        let tree: Value = serde_json::from_str(json)?;
        Self::from_json_tree(tree)
    }

    /// Parse an envelope from raw mirror contents, keeping the arrival metadata.
    pub fn from_mirror(contents: &[u8], arrival: ArrivalMetadata) -> Result<Self> {
        let tree: Value = serde_json::from_slice(contents)?;
        let mut envelope = Self::from_json_tree(tree)?;
        envelope.arrival = Some(arrival);
        Ok(envelope)
    }

    fn from_json_tree(tree: Value) -> Result<Self> {
        let Value::Object(mut root) = tree else {
            return Err(DidError::Decoding("envelope is not a JSON object".into()));
        };

        let message = match root.remove("message") {
            None | Some(Value::Null) => None,
            Some(tree) => Some(M::from_json_tree(tree)?),
        };

        let signature = match root.remove("signature") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                return Err(DidError::Decoding(format!(
                    "signature must be a string, got {}",
                    other
                )))
            }
        };

        Ok(Self {
            message,
            signature,
            arrival: None,
        })
    }
}
