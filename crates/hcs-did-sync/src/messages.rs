//! Items exchanged with the ledger's mirror feed.

use bytes::Bytes;
use chrono::{DateTime, Utc};

use hcs_did_core::{ArrivalMetadata, TopicId};

/// One message as delivered by the mirror feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMessage {
    pub topic_id: TopicId,
    pub contents: Bytes,
    pub consensus_timestamp: DateTime<Utc>,
    pub sequence_number: u64,
}

impl TopicMessage {
    /// Arrival metadata attached to envelopes parsed from this message.
    pub fn arrival(&self) -> ArrivalMetadata {
        ArrivalMetadata {
            consensus_timestamp: self.consensus_timestamp,
            sequence_number: self.sequence_number,
        }
    }
}

/// What to read from a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicQuery {
    pub topic_id: TopicId,
    /// Inclusive lower bound on consensus time.
    pub start_time: Option<DateTime<Utc>>,
    /// Inclusive upper bound on consensus time. `None` follows the live tail.
    pub end_time: Option<DateTime<Utc>>,
    /// Stop after this many messages.
    pub limit: Option<u64>,
}

impl TopicQuery {
    pub fn new(topic_id: TopicId) -> Self {
        Self {
            topic_id,
            start_time: None,
            end_time: None,
            limit: None,
        }
    }

    /// Whether a consensus timestamp falls inside the query window.
    pub fn in_window(&self, consensus_timestamp: &DateTime<Utc>) -> bool {
        let after_start = self.start_time.map_or(true, |s| *consensus_timestamp >= s);
        let before_end = self.end_time.map_or(true, |e| *consensus_timestamp <= e);
        after_start && before_end
    }

    /// Whether the window closed before `consensus_timestamp`.
    pub fn is_past_end(&self, consensus_timestamp: &DateTime<Utc>) -> bool {
        self.end_time.map_or(false, |e| *consensus_timestamp > e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_query_window() {
        let now = Utc::now();
        let mut query = TopicQuery::new(TopicId::new(0, 0, 1));
        assert!(query.in_window(&now));

        query.start_time = Some(now);
        query.end_time = Some(now + Duration::seconds(10));
        assert!(query.in_window(&now));
        assert!(query.in_window(&(now + Duration::seconds(10))));
        assert!(!query.in_window(&(now - Duration::seconds(1))));
        assert!(!query.in_window(&(now + Duration::seconds(11))));
        assert!(query.is_past_end(&(now + Duration::seconds(11))));
        assert!(!query.is_past_end(&now));
    }
}
