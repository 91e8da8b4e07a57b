//! Topic listener: turns the raw mirror feed into validated DID envelopes.
//!
//! Each item runs through the filters, is parsed into an envelope and has its
//! message checked against the listener's topic. Rejected items go to the
//! invalid-message handler; parse errors go to the error handler, or stop the
//! subscription when there is none and errors are not ignored.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;

use hcs_did_core::{DidMessage, MessageEnvelope, TopicId};

use crate::error::{Result, SyncError};
use crate::gateway::LedgerGateway;
use crate::messages::{TopicMessage, TopicQuery};

pub const REJECTED_BY_FILTER: &str = "Message was rejected by external filter";
pub const EXTRACTION_FAILED: &str = "Extracting envelope from the mirror response failed";
pub const EMPTY_MESSAGE: &str = "Empty message received when opening envelope";
pub const VALIDATION_FAILED: &str = "Message content validation failed.";

pub type MessageFilter = Box<dyn Fn(&TopicMessage) -> bool + Send + Sync>;
pub type ErrorHandler = Arc<dyn Fn(&SyncError) + Send + Sync>;
pub type InvalidMessageHandler = Arc<dyn Fn(&TopicMessage, &str) + Send + Sync>;
pub type CompleteHandler = Box<dyn FnOnce() + Send>;

/// A listener for DID messages on one consensus topic.
pub struct TopicListener {
    query: TopicQuery,
    filters: Vec<MessageFilter>,
    error_handler: Option<ErrorHandler>,
    invalid_handler: Option<InvalidMessageHandler>,
    complete_handler: Option<CompleteHandler>,
    ignore_errors: bool,
    task: Option<JoinHandle<Result<()>>>,
}

impl TopicListener {
    /// A listener reading `topic_id` from the start of the topic.
    pub fn new(topic_id: TopicId) -> Self {
        let mut query = TopicQuery::new(topic_id);
        query.start_time = Some(DateTime::<Utc>::default());

        Self {
            query,
            filters: Vec::new(),
            error_handler: None,
            invalid_handler: None,
            complete_handler: None,
            ignore_errors: false,
            task: None,
        }
    }

    pub fn topic_id(&self) -> &TopicId {
        &self.query.topic_id
    }

    pub fn start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.query.start_time = Some(start_time);
        self
    }

    pub fn end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.query.end_time = Some(end_time);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn ignore_errors(mut self, ignore: bool) -> Self {
        self.ignore_errors = ignore;
        self
    }

    /// Add a filter. Filters run in the order added, before any parsing.
    pub fn add_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&TopicMessage) -> bool + Send + Sync + 'static,
    {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&SyncError) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    pub(crate) fn on_error_shared(mut self, handler: Option<ErrorHandler>) -> Self {
        self.error_handler = handler;
        self
    }

    /// Handler for rejected items, called with the item and the reason.
    pub fn on_invalid_message<F>(mut self, handler: F) -> Self
    where
        F: Fn(&TopicMessage, &str) + Send + Sync + 'static,
    {
        self.invalid_handler = Some(Arc::new(handler));
        self
    }

    /// Handler called once when the feed ends.
    pub fn on_complete<F>(mut self, handler: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.complete_handler = Some(Box::new(handler));
        self
    }

    pub fn is_subscribed(&self) -> bool {
        self.task.as_ref().map_or(false, |t| !t.is_finished())
    }

    /// Subscribe and deliver every accepted envelope to `receiver`.
    ///
    /// Delivery happens on a background task.
    pub async fn subscribe<F>(&mut self, gateway: &dyn LedgerGateway, mut receiver: F) -> Result<()>
    where
        F: FnMut(MessageEnvelope<DidMessage>) + Send + 'static,
    {
        if self.task.is_some() {
            return Err(SyncError::AlreadySubscribed);
        }

        let mut subscription = gateway.subscribe(self.query.clone()).await?;

        let pipeline = Pipeline {
            topic_id: self.query.topic_id,
            filters: std::mem::take(&mut self.filters),
            error_handler: self.error_handler.clone(),
            invalid_handler: self.invalid_handler.clone(),
            ignore_errors: self.ignore_errors,
        };
        let complete = self.complete_handler.take();

        self.task = Some(tokio::spawn(async move {
            while let Some(message) = subscription.next().await {
                match pipeline.handle(&message) {
                    Ok(Some(envelope)) => receiver(envelope),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::error!("listener on topic {} stopped: {}", pipeline.topic_id, e);
                        return Err(e);
                    }
                }
            }

            if let Some(complete) = complete {
                complete();
            }
            Ok(())
        }));

        Ok(())
    }

    /// Stop delivery. Safe to call any number of times.
    pub fn unsubscribe(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Wait for the feed to end. Returns the error that stopped it, if any.
    pub async fn wait(&mut self) -> Result<()> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };

        match task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(SyncError::Cancelled),
            Err(e) => Err(SyncError::Gateway(format!("listener task failed: {}", e))),
        }
    }
}

impl Drop for TopicListener {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for TopicListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopicListener")
            .field("query", &self.query)
            .field("filters", &self.filters.len())
            .field("ignore_errors", &self.ignore_errors)
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}

/// The per-item checks, owned by the delivery task.
pub(crate) struct Pipeline {
    pub(crate) topic_id: TopicId,
    pub(crate) filters: Vec<MessageFilter>,
    pub(crate) error_handler: Option<ErrorHandler>,
    pub(crate) invalid_handler: Option<InvalidMessageHandler>,
    pub(crate) ignore_errors: bool,
}

impl Pipeline {
    /// `Ok(Some)` to deliver, `Ok(None)` to skip, `Err` to stop listening.
    pub(crate) fn handle(&self, message: &TopicMessage) -> Result<Option<MessageEnvelope<DidMessage>>> {
        if self.filters.iter().any(|filter| !filter(message)) {
            self.report_invalid(message, REJECTED_BY_FILTER);
            return Ok(None);
        }

        let envelope =
            match MessageEnvelope::<DidMessage>::from_mirror(&message.contents, message.arrival()) {
                Ok(envelope) => envelope,
                Err(e) => {
                    self.handle_error(SyncError::InvalidMessage(format!(
                        "{}: {}",
                        EXTRACTION_FAILED, e
                    )))?;
                    self.report_invalid(message, EXTRACTION_FAILED);
                    return Ok(None);
                }
            };

        let Some(did_message) = envelope.open() else {
            self.report_invalid(message, EMPTY_MESSAGE);
            return Ok(None);
        };

        if !did_message.is_valid(Some(&self.topic_id)) {
            self.report_invalid(message, VALIDATION_FAILED);
            return Ok(None);
        }

        Ok(Some(envelope))
    }

    fn handle_error(&self, error: SyncError) -> Result<()> {
        if let Some(handler) = &self.error_handler {
            handler(&error);
            Ok(())
        } else if self.ignore_errors {
            tracing::debug!("ignoring listener error: {}", error);
            Ok(())
        } else {
            Err(error)
        }
    }

    fn report_invalid(&self, message: &TopicMessage, reason: &str) {
        tracing::debug!(
            "rejected message #{} on topic {}: {}",
            message.sequence_number,
            message.topic_id,
            reason
        );
        if let Some(handler) = &self.invalid_handler {
            handler(message, reason);
        }
    }
}
