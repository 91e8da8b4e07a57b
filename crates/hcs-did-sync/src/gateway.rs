//! Ledger gateway abstraction.
//!
//! The gateway submits messages to a consensus topic and streams the topic
//! back from a mirror. Implementations wrap a real network client; the
//! [`memory`] ledger serves tests.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use hcs_did_core::{TopicId, TransactionId};

use crate::error::Result;
use crate::messages::{TopicMessage, TopicQuery};

/// A live subscription to a topic's mirror feed.
///
/// Dropping the subscription unsubscribes.
#[derive(Debug)]
pub struct TopicSubscription {
    receiver: mpsc::UnboundedReceiver<TopicMessage>,
}

impl TopicSubscription {
    pub fn new(receiver: mpsc::UnboundedReceiver<TopicMessage>) -> Self {
        Self { receiver }
    }

    /// Next message, or `None` once the feed has ended.
    pub async fn next(&mut self) -> Option<TopicMessage> {
        self.receiver.recv().await
    }
}

/// Access to a consensus topic and its mirror feed.
///
/// Implementations must be thread-safe (Send + Sync). Retrying failed
/// submissions is up to the implementation.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Submit message bytes to a topic.
    async fn submit(&self, topic_id: &TopicId, contents: Bytes) -> Result<TransactionId>;

    /// Stream the topic's messages matching `query`, in consensus order.
    async fn subscribe(&self, query: TopicQuery) -> Result<TopicSubscription>;
}

/// An in-memory ledger for testing.
///
/// Every topic is an append-only log; subscribers get the matching history
/// followed by live messages.
pub mod memory {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use crate::error::SyncError;

    struct Subscriber {
        query: TopicQuery,
        sender: mpsc::UnboundedSender<TopicMessage>,
        delivered: u64,
    }

    impl Subscriber {
        /// Deliver if the message matches. Returns false once the subscriber is done.
        fn offer(&mut self, message: &TopicMessage) -> bool {
            if self.query.is_past_end(&message.consensus_timestamp) {
                return false;
            }
            if self.query.in_window(&message.consensus_timestamp) {
                if self.sender.send(message.clone()).is_err() {
                    return false;
                }
                self.delivered += 1;
            }
            self.query.limit.map_or(true, |limit| self.delivered < limit)
        }
    }

    #[derive(Default)]
    struct TopicLog {
        messages: Vec<TopicMessage>,
        subscribers: Vec<Subscriber>,
    }

    /// Shared state of the in-memory ledger.
    #[derive(Default)]
    pub struct MemoryLedger {
        topics: RwLock<HashMap<TopicId, TopicLog>>,
        last_timestamp: RwLock<Option<DateTime<Utc>>>,
        fail_submissions: AtomicBool,
    }

    impl MemoryLedger {
        /// Create a new memory ledger.
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Make every following `submit` fail (or succeed again).
        pub fn set_fail_submissions(&self, fail: bool) {
            self.fail_submissions.store(fail, Ordering::SeqCst);
        }

        /// Append raw bytes to a topic, bypassing submission checks.
        pub async fn append(&self, topic_id: &TopicId, contents: Bytes) -> TopicMessage {
            let consensus_timestamp = self.next_timestamp().await;
            self.append_at(topic_id, contents, consensus_timestamp).await
        }

        /// Append raw bytes under an explicit consensus timestamp.
        pub async fn append_at(
            &self,
            topic_id: &TopicId,
            contents: Bytes,
            consensus_timestamp: DateTime<Utc>,
        ) -> TopicMessage {
            {
                let mut last = self.last_timestamp.write().await;
                if last.map_or(true, |prev| consensus_timestamp > prev) {
                    *last = Some(consensus_timestamp);
                }
            }

            let mut topics = self.topics.write().await;
            let log = topics.entry(*topic_id).or_default();

            let message = TopicMessage {
                topic_id: *topic_id,
                contents,
                consensus_timestamp,
                sequence_number: log.messages.len() as u64 + 1,
            };
            log.messages.push(message.clone());
            log.subscribers.retain_mut(|s| s.offer(&message));

            message
        }

        /// Every message on a topic so far.
        pub async fn messages(&self, topic_id: &TopicId) -> Vec<TopicMessage> {
            self.topics
                .read()
                .await
                .get(topic_id)
                .map(|log| log.messages.clone())
                .unwrap_or_default()
        }

        /// Number of subscribers still attached to a topic.
        pub async fn subscriber_count(&self, topic_id: &TopicId) -> usize {
            let mut topics = self.topics.write().await;
            match topics.get_mut(topic_id) {
                Some(log) => {
                    log.subscribers.retain(|s| !s.sender.is_closed());
                    log.subscribers.len()
                }
                None => 0,
            }
        }

        async fn next_timestamp(&self) -> DateTime<Utc> {
            let mut last = self.last_timestamp.write().await;
            let now = Utc::now();
            let next = match *last {
                Some(prev) if now <= prev => prev + Duration::nanoseconds(1),
                _ => now,
            };
            *last = Some(next);
            next
        }
    }

    #[async_trait]
    impl LedgerGateway for MemoryLedger {
        async fn submit(&self, topic_id: &TopicId, contents: Bytes) -> Result<TransactionId> {
            if self.fail_submissions.load(Ordering::SeqCst) {
                return Err(SyncError::Gateway("submission rejected".into()));
            }

            let message = self.append(topic_id, contents).await;
            let ts = message.consensus_timestamp;
            Ok(TransactionId::new(format!(
                "0.0.2@{}.{:09}",
                ts.timestamp(),
                ts.timestamp_subsec_nanos()
            )))
        }

        async fn subscribe(&self, query: TopicQuery) -> Result<TopicSubscription> {
            let (sender, receiver) = mpsc::unbounded_channel();
            let mut subscriber = Subscriber {
                query,
                sender,
                delivered: 0,
            };

            let mut topics = self.topics.write().await;
            let log = topics.entry(subscriber.query.topic_id).or_default();

            let mut open = subscriber.query.limit != Some(0);
            if open {
                for message in &log.messages {
                    if !subscriber.offer(message) {
                        open = false;
                        break;
                    }
                }
            }
            if open {
                log.subscribers.push(subscriber);
            }

            Ok(TopicSubscription::new(receiver))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryLedger;
    use super::*;
    use chrono::Utc;

    fn topic() -> TopicId {
        TopicId::new(0, 0, 2)
    }

    #[tokio::test]
    async fn test_history_then_live() {
        let ledger = MemoryLedger::new();
        ledger.submit(&topic(), Bytes::from_static(b"one")).await.unwrap();

        let mut sub = ledger.subscribe(TopicQuery::new(topic())).await.unwrap();
        ledger.submit(&topic(), Bytes::from_static(b"two")).await.unwrap();

        let first = sub.next().await.unwrap();
        let second = sub.next().await.unwrap();
        assert_eq!(first.contents, Bytes::from_static(b"one"));
        assert_eq!(second.contents, Bytes::from_static(b"two"));
        assert_eq!(second.sequence_number, 2);
        assert!(second.consensus_timestamp > first.consensus_timestamp);
    }

    #[tokio::test]
    async fn test_end_time_closes_feed() {
        let ledger = MemoryLedger::new();
        ledger.submit(&topic(), Bytes::from_static(b"old")).await.unwrap();

        let mut query = TopicQuery::new(topic());
        query.end_time = Some(Utc::now());
        let mut sub = ledger.subscribe(query).await.unwrap();

        ledger.submit(&topic(), Bytes::from_static(b"new")).await.unwrap();

        assert_eq!(sub.next().await.unwrap().contents, Bytes::from_static(b"old"));
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn test_limit() {
        let ledger = MemoryLedger::new();
        for body in [&b"a"[..], &b"b"[..], &b"c"[..]] {
            ledger.submit(&topic(), Bytes::copy_from_slice(body)).await.unwrap();
        }

        let mut query = TopicQuery::new(topic());
        query.limit = Some(2);
        let mut sub = ledger.subscribe(query).await.unwrap();

        assert!(sub.next().await.is_some());
        assert!(sub.next().await.is_some());
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_pruned() {
        let ledger = MemoryLedger::new();
        let sub = ledger.subscribe(TopicQuery::new(topic())).await.unwrap();
        assert_eq!(ledger.subscriber_count(&topic()).await, 1);

        drop(sub);
        assert_eq!(ledger.subscriber_count(&topic()).await, 0);
    }

    #[tokio::test]
    async fn test_failing_submissions() {
        let ledger = MemoryLedger::new();
        ledger.set_fail_submissions(true);
        assert!(ledger.submit(&topic(), Bytes::from_static(b"x")).await.is_err());
        assert!(ledger.messages(&topic()).await.is_empty());
    }
}
