//! Publishing a DID message to its topic.
//!
//! A transaction signs the envelope (unless it already carries a signature),
//! submits it through the gateway and, when asked, waits until the same
//! bytes come back on the topic's mirror feed.

use bytes::Bytes;
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use hcs_did_core::{DidMessage, MessageEnvelope, Signer, TopicId, TransactionId};

use crate::error::{Result, SyncError};
use crate::gateway::LedgerGateway;
use crate::listener::{ErrorHandler, TopicListener};

const VALIDATION_PREFIX: &str = "MessageTransaction execution failed: ";

/// Outcome of a submitted transaction.
#[derive(Debug, Clone)]
pub struct TransactionReceipt {
    pub transaction_id: TransactionId,
    /// The envelope as read back from the topic, if confirmation was awaited.
    pub confirmed: Option<MessageEnvelope<DidMessage>>,
}

type Confirmation = mpsc::UnboundedReceiver<Result<MessageEnvelope<DidMessage>>>;

/// A single-use publication of one envelope.
pub struct DidTransaction {
    topic_id: TopicId,
    envelope: MessageEnvelope<DidMessage>,
    signer: Option<Arc<dyn Signer>>,
    gateway: Option<Arc<dyn LedgerGateway>>,
    confirmation_timeout: Option<Duration>,
    error_handler: Option<ErrorHandler>,
    executed: bool,
}

impl DidTransaction {
    pub fn new(envelope: MessageEnvelope<DidMessage>, topic_id: TopicId) -> Self {
        Self {
            topic_id,
            envelope,
            signer: None,
            gateway: None,
            confirmation_timeout: None,
            error_handler: None,
            executed: false,
        }
    }

    /// Signer for an envelope that is not signed yet.
    pub fn signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn gateway(mut self, gateway: Arc<dyn LedgerGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Wait up to `timeout` for the message to appear on the topic.
    pub fn await_confirmation(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = Some(timeout);
        self
    }

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

    pub fn envelope(&self) -> &MessageEnvelope<DidMessage> {
        &self.envelope
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Check that the transaction can run.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        if self.executed {
            problems.push("This transaction has already been executed.");
        }
        if self.signer.is_none() && !self.envelope.is_signed() {
            problems.push("Signing function is missing.");
        }
        if self.gateway.is_none() {
            problems.push("Transaction builder is missing.");
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(SyncError::Validation(format!(
                "{}{}",
                VALIDATION_PREFIX,
                problems.join(", ")
            )))
        }
    }

    /// Sign, submit and optionally wait for confirmation.
    pub async fn execute(&mut self) -> Result<TransactionReceipt> {
        self.validate()?;
        let gateway = self
            .gateway
            .clone()
            .ok_or_else(|| SyncError::Validation(format!("{}Transaction builder is missing.", VALIDATION_PREFIX)))?;

        let contents = if self.envelope.is_signed() {
            self.envelope.to_json()?.into_bytes()
        } else {
            self.envelope.sign(self.signer.as_deref())?
        };
        let contents = Bytes::from(contents);

        let mut confirmation = match self.confirmation_timeout {
            Some(_) => Some(self.listen_for(gateway.as_ref(), contents.clone()).await?),
            None => None,
        };

        let transaction_id = match gateway.submit(&self.topic_id, contents).await {
            Ok(id) => id,
            Err(e) => {
                if let Some((listener, _)) = confirmation.as_mut() {
                    listener.unsubscribe();
                }
                self.report(&e);
                return Err(e);
            }
        };
        self.executed = true;
        tracing::debug!("submitted DID message to topic {} as {}", self.topic_id, transaction_id);

        let confirmed = match (confirmation, self.confirmation_timeout) {
            (Some((listener, receiver)), Some(timeout)) => {
                Some(self.confirm(listener, receiver, timeout, &transaction_id).await?)
            }
            _ => None,
        };

        Ok(TransactionReceipt {
            transaction_id,
            confirmed,
        })
    }

    async fn listen_for(
        &self,
        gateway: &dyn LedgerGateway,
        contents: Bytes,
    ) -> Result<(TopicListener, Confirmation)> {
        let (sender, receiver) = mpsc::unbounded_channel();

        let expected = contents.clone();
        let rejected = sender.clone();
        let mut listener = TopicListener::new(self.topic_id)
            .start_time(Utc::now() - chrono::Duration::seconds(1))
            .ignore_errors(false)
            .add_filter(move |message| message.contents == expected)
            .on_error_shared(self.error_handler.clone())
            .on_invalid_message(move |message, reason| {
                if message.contents != contents {
                    return;
                }
                let _ = rejected.send(Err(SyncError::InvalidMessage(format!(
                    "{}: {}",
                    reason,
                    String::from_utf8_lossy(&message.contents)
                ))));
            });

        listener
            .subscribe(gateway, move |envelope| {
                let _ = sender.send(Ok(envelope));
            })
            .await?;

        Ok((listener, receiver))
    }

    async fn confirm(
        &self,
        mut listener: TopicListener,
        mut receiver: Confirmation,
        timeout: Duration,
        transaction_id: &TransactionId,
    ) -> Result<MessageEnvelope<DidMessage>> {
        let outcome = tokio::time::timeout(timeout, receiver.recv()).await;

        let result = match outcome {
            Ok(Some(result)) => result,
            Ok(None) => {
                // The feed ended; surface whatever stopped it.
                listener.wait().await?;
                Err(SyncError::Cancelled)
            }
            Err(_) => Err(SyncError::Timeout(format!(
                "transaction {} was not confirmed within {:?}",
                transaction_id, timeout
            ))),
        };
        listener.unsubscribe();

        if let Err(e) = &result {
            self.report(e);
        }
        result
    }

    fn report(&self, error: &SyncError) {
        tracing::warn!("DID transaction on topic {} failed: {}", self.topic_id, error);
        if let Some(handler) = &self.error_handler {
            handler(error);
        }
    }
}

impl fmt::Debug for DidTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DidTransaction")
            .field("topic_id", &self.topic_id)
            .field("signed", &self.envelope.is_signed())
            .field("executed", &self.executed)
            .field("confirmation_timeout", &self.confirmation_timeout)
            .finish()
    }
}
