//! The `did:hedera` identifier.
//!
//! Format: `did:hedera:<network>:<idString>_<topicId>`, where `idString` is the
//! multibase form of the DID root public key.

use std::fmt;
use std::str::FromStr;

use crate::crypto::Ed25519PublicKey;
use crate::error::{DidError, Result};
use crate::types::{Network, TopicId};

pub const DID_PREFIX: &str = "did";
pub const DID_METHOD: &str = "hedera";
pub const METHOD_SEPARATOR: char = ':';
pub const TOPIC_SEPARATOR: char = '_';

/// Shortest accepted `idString`.
pub const MIN_ID_STRING_LENGTH: usize = 48;

/// A parsed, immutable `did:hedera` identifier.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HcsDid {
    network: Network,
    id_string: String,
    topic_id: Option<TopicId>,
}

impl HcsDid {
    /// Derive the identifier for a root public key.
    pub fn from_public_key(
        network: Network,
        public_key: &Ed25519PublicKey,
        topic_id: Option<TopicId>,
    ) -> Self {
        Self {
            network,
            id_string: public_key.to_multibase(),
            topic_id,
        }
    }

    /// Parse a DID string.
    pub fn parse(s: &str) -> Result<Self> {
        let mut topic_split = s.split(TOPIC_SEPARATOR);
        let base = topic_split.next().unwrap_or_default();
        let topic_part = topic_split.next();
        if topic_split.next().is_some() {
            return Err(DidError::InvalidDidString(
                "DID string is invalid: more than one topic separator".into(),
            ));
        }

        let topic_id = match topic_part {
            None => None,
            Some("") => {
                return Err(DidError::InvalidDidString(
                    "DID string is invalid: topic ID is missing".into(),
                ))
            }
            Some(topic) => Some(topic.parse::<TopicId>().map_err(|_| {
                DidError::InvalidDidString(format!(
                    "DID string is invalid: bad topic ID {}",
                    topic
                ))
            })?),
        };

        let segments: Vec<&str> = base.split(METHOD_SEPARATOR).collect();
        if segments.len() != 4 {
            return Err(DidError::InvalidDidString(
                "DID string is invalid: expected 4 colon-separated segments".into(),
            ));
        }

        if segments[0] != DID_PREFIX {
            return Err(DidError::InvalidDidString(
                "DID string is invalid: invalid prefix".into(),
            ));
        }

        if segments[1] != DID_METHOD {
            return Err(DidError::InvalidDidString(
                "DID string is invalid: invalid method name".into(),
            ));
        }

        let network: Network = segments[2].parse()?;

        let id_string = segments[3];
        if id_string.len() < MIN_ID_STRING_LENGTH {
            return Err(DidError::InvalidDidString(
                "DID string is invalid: ID holds incorrect format".into(),
            ));
        }

        Ok(Self {
            network,
            id_string: id_string.to_string(),
            topic_id,
        })
    }

    /// Format the parts of a DID string. Exact inverse of [`Self::parse`].
    pub fn build(network: Network, id_string: &str, topic_id: Option<&TopicId>) -> String {
        let base = format!(
            "{}{sep}{}{sep}{}{sep}{}",
            DID_PREFIX,
            DID_METHOD,
            network,
            id_string,
            sep = METHOD_SEPARATOR
        );
        match topic_id {
            Some(topic) => format!("{}{}{}", base, TOPIC_SEPARATOR, topic),
            None => base,
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn id_string(&self) -> &str {
        &self.id_string
    }

    pub fn topic_id(&self) -> Option<&TopicId> {
        self.topic_id.as_ref()
    }

    /// The root public key encoded in the id string.
    pub fn public_key(&self) -> Result<Ed25519PublicKey> {
        Ed25519PublicKey::from_multibase(&self.id_string)
    }

    /// The id of the root key event, `<did>#did-root-key`.
    pub fn root_key_id(&self) -> String {
        format!("{}#did-root-key", self)
    }
}

impl fmt::Display for HcsDid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::build(
            self.network,
            &self.id_string,
            self.topic_id.as_ref(),
        ))
    }
}

impl fmt::Debug for HcsDid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HcsDid({})", self)
    }
}

impl FromStr for HcsDid {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Keypair, Signer};
    use crate::error::DidErrorCode;

    fn id_string() -> String {
        Keypair::from_seed(&[3u8; 32]).public_key().to_multibase()
    }

    #[test]
    fn test_parse_valid() {
        let s = format!("did:hedera:testnet:{}_0.0.29613327", id_string());
        let did = HcsDid::parse(&s).unwrap();

        assert_eq!(did.network(), Network::Testnet);
        assert_eq!(did.id_string(), id_string());
        assert_eq!(did.topic_id(), Some(&TopicId::new(0, 0, 29613327)));
        assert_eq!(did.to_string(), s);
    }

    #[test]
    fn test_parse_without_topic() {
        let s = format!("did:hedera:mainnet:{}", id_string());
        let did = HcsDid::parse(&s).unwrap();
        assert!(did.topic_id().is_none());
        assert_eq!(did.to_string(), s);
    }

    #[test]
    fn test_build_is_inverse_of_parse() {
        let topic = TopicId::new(0, 0, 7);
        let s = HcsDid::build(Network::Previewnet, &id_string(), Some(&topic));
        let did = HcsDid::parse(&s).unwrap();
        assert_eq!(
            HcsDid::build(did.network(), did.id_string(), did.topic_id()),
            s
        );
    }

    #[test]
    fn test_from_public_key() {
        let keypair = Keypair::from_seed(&[3u8; 32]);
        let did =
            HcsDid::from_public_key(Network::Testnet, &keypair.public_key(), Some(TopicId::new(0, 0, 1)));
        assert_eq!(did.public_key().unwrap(), keypair.public_key());
        assert!(did.root_key_id().ends_with("_0.0.1#did-root-key"));
    }

    #[test]
    fn test_parse_invalid_strings() {
        let id = id_string();
        let invalid = [
            String::new(),
            "did:hedera:testnet:_0.0.1".to_string(),
            format!("did:hedera:testnet:{}_", id),
            format!("did:hedera:testnet:{}_0.0.1_0.0.2", id),
            format!("did:hedera:testnet:{}_notatopic", id),
            format!("did:hedera:testnet:{}:extra_0.0.1", id),
            format!("hedera:testnet:{}_0.0.1", id),
            format!("dad:hedera:testnet:{}_0.0.1", id),
            format!("did:hashgraph:testnet:{}_0.0.1", id),
            "did:hedera:testnet:z6Mkshort_0.0.1".to_string(),
        ];

        for s in &invalid {
            let err = HcsDid::parse(s).unwrap_err();
            assert_eq!(err.code(), DidErrorCode::InvalidDidString, "{}", s);
        }
    }

    #[test]
    fn test_parse_invalid_network() {
        let s = format!("did:hedera:devnet:{}_0.0.1", id_string());
        let err = HcsDid::parse(&s).unwrap_err();
        assert_eq!(err.code(), DidErrorCode::InvalidNetwork);
    }
}
