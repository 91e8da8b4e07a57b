//! Strong type definitions for the HCS DID method.
//!
//! Ledger entity ids, networks and operations are newtypes and enums so the
//! string forms are parsed once at the boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DidError;

/// A consensus topic id in `shard.realm.num` form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl TopicId {
    /// Create a topic id from its components.
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }
}

impl fmt::Debug for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TopicId({})", self)
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for TopicId {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(DidError::InvalidTopicId(s.to_string()));
        }

        let parse = |p: &str| {
            p.parse::<u64>()
                .map_err(|_| DidError::InvalidTopicId(s.to_string()))
        };

        Ok(Self {
            shard: parse(parts[0])?,
            realm: parse(parts[1])?,
            num: parse(parts[2])?,
        })
    }
}

impl Serialize for TopicId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TopicId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Ledger network a DID lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Mainnet,
    Testnet,
    Previewnet,
}

impl Network {
    /// The network label as it appears in a DID string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Previewnet => "previewnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "previewnet" => Ok(Network::Previewnet),
            other => Err(DidError::InvalidNetwork(format!(
                "DID string is invalid. Invalid Hedera network: {}",
                other
            ))),
        }
    }
}

/// The operation a DID message applies to its event target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DidOperation {
    #[serde(alias = "CREATE")]
    Create,
    #[serde(alias = "UPDATE")]
    Update,
    #[serde(alias = "REVOKE")]
    Revoke,
    #[serde(alias = "DELETE")]
    Delete,
}

impl DidOperation {
    /// Wire label of the operation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DidOperation::Create => "create",
            DidOperation::Update => "update",
            DidOperation::Revoke => "revoke",
            DidOperation::Delete => "delete",
        }
    }
}

impl fmt::Display for DidOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier the ledger gateway assigns to a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DidErrorCode;

    #[test]
    fn test_topic_id_roundtrip() {
        let topic: TopicId = "0.0.12345".parse().unwrap();
        assert_eq!(topic, TopicId::new(0, 0, 12345));
        assert_eq!(topic.to_string(), "0.0.12345");
    }

    #[test]
    fn test_topic_id_rejects_malformed() {
        assert!("0.0".parse::<TopicId>().is_err());
        assert!("0.0.x".parse::<TopicId>().is_err());
        assert!("0.0.1.2".parse::<TopicId>().is_err());
        assert!("".parse::<TopicId>().is_err());
    }

    #[test]
    fn test_network_parse() {
        assert_eq!("testnet".parse::<Network>().unwrap(), Network::Testnet);
        let err = "devnet".parse::<Network>().unwrap_err();
        assert_eq!(err.code(), DidErrorCode::InvalidNetwork);
    }

    #[test]
    fn test_operation_serde() {
        let json = serde_json::to_string(&DidOperation::Revoke).unwrap();
        assert_eq!(json, "\"revoke\"");

        let op: DidOperation = serde_json::from_str("\"CREATE\"").unwrap();
        assert_eq!(op, DidOperation::Create);
    }
}
