use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A persisted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Store-assigned identifier, strictly increasing in insertion order.
    pub id: i64,
    /// ISO-8601 arrival timestamp.
    pub timestamp: String,
    /// Decoded message text.
    pub message: String,
}

/// Message history shared by the ingestion thread and query callers.
///
/// Implementations serialize concurrent access internally; callers never
/// lock around them.
pub trait MessageStore: Send + Sync {
    /// Persist one message and return its identifier.
    fn append(&self, message: &str, timestamp: &str) -> Result<i64>;

    /// The newest `limit` records, highest identifier first.
    fn recent_records(&self, limit: usize) -> Result<Vec<MessageRecord>>;

    /// Backend name for diagnostics.
    fn backend(&self) -> &'static str;
}

impl<S: MessageStore + ?Sized> MessageStore for Arc<S> {
    fn append(&self, message: &str, timestamp: &str) -> Result<i64> {
        (**self).append(message, timestamp)
    }

    fn recent_records(&self, limit: usize) -> Result<Vec<MessageRecord>> {
        (**self).recent_records(limit)
    }

    fn backend(&self) -> &'static str {
        (**self).backend()
    }
}
