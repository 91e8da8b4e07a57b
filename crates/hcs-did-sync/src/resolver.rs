//! Collects every DID message on a topic.
//!
//! The resolver reads the topic from its first message up to the moment it
//! started, and finishes once no message has arrived for the idle timeout.
//! Envelopes carrying a signature already seen are dropped.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use hcs_did_core::{DidMessage, MessageEnvelope, TopicId};

use crate::error::{Result, SyncError};
use crate::gateway::LedgerGateway;
use crate::listener::{ErrorHandler, TopicListener};

/// Resolver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// How long the topic must stay quiet before resolution finishes.
    pub idle_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(5),
        }
    }
}

struct State {
    collected: Vec<MessageEnvelope<DidMessage>>,
    seen: HashSet<String>,
    last_arrival: Instant,
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// One-shot reader of a DID topic.
pub struct EventMessageResolver {
    topic_id: TopicId,
    config: ResolverConfig,
    did: Option<String>,
    start_time: DateTime<Utc>,
    error_handler: Option<ErrorHandler>,
}

impl EventMessageResolver {
    pub fn new(topic_id: TopicId, config: ResolverConfig) -> Self {
        Self {
            topic_id,
            config,
            did: None,
            start_time: DateTime::<Utc>::default(),
            error_handler: None,
        }
    }

    /// Keep only messages about `did`.
    pub fn for_did(mut self, did: impl Into<String>) -> Self {
        self.did = Some(did.into());
        self
    }

    pub fn start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = start_time;
        self
    }

    /// Handler for messages that cannot be parsed. Without one, the first
    /// such message fails the resolution.
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&SyncError) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    pub fn topic_id(&self) -> &TopicId {
        &self.topic_id
    }

    /// Read the topic and return the collected envelopes in consensus order.
    pub async fn execute(self, gateway: &dyn LedgerGateway) -> Result<Vec<MessageEnvelope<DidMessage>>> {
        let state = Arc::new(Mutex::new(State {
            collected: Vec::new(),
            seen: HashSet::new(),
            last_arrival: Instant::now(),
        }));

        let mut listener = TopicListener::new(self.topic_id)
            .start_time(self.start_time)
            .end_time(Utc::now())
            .ignore_errors(false)
            .on_error_shared(self.error_handler.clone());

        let sink = state.clone();
        let did = self.did.clone();
        listener
            .subscribe(gateway, move |envelope| {
                let mut state = lock(&sink);
                state.last_arrival = Instant::now();

                if !matches_did(did.as_deref(), &envelope) {
                    return;
                }

                // Unsigned envelopes share the empty key.
                let key = envelope.signature().unwrap_or_default().to_string();
                if state.seen.insert(key) {
                    state.collected.push(envelope);
                }
            })
            .await?;

        lock(&state).last_arrival = Instant::now();

        loop {
            let elapsed = lock(&state).last_arrival.elapsed();
            if elapsed >= self.config.idle_timeout {
                break;
            }
            tokio::time::sleep(self.config.idle_timeout - elapsed).await;
        }

        if listener.is_subscribed() {
            listener.unsubscribe();
        } else {
            listener.wait().await?;
        }

        let collected = std::mem::take(&mut lock(&state).collected);
        tracing::debug!(
            "resolved {} messages from topic {}",
            collected.len(),
            self.topic_id
        );
        Ok(collected)
    }
}

fn matches_did(did: Option<&str>, envelope: &MessageEnvelope<DidMessage>) -> bool {
    match did {
        Some(did) => envelope.open().and_then(DidMessage::did) == Some(did),
        None => true,
    }
}
