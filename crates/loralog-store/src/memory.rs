use std::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::record::{MessageRecord, MessageStore};

/// Volatile store kept in process memory.
///
/// History is lost on exit. Useful for tests and for running the listener
/// without a database file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    last_id: i64,
    records: Vec<MessageRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        match self.inner.read() {
            Ok(inner) => inner.records.len(),
            Err(poisoned) => poisoned.into_inner().records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".to_string())
}

impl MessageStore for MemoryStore {
    fn append(&self, message: &str, timestamp: &str) -> Result<i64> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        inner.last_id += 1;
        let id = inner.last_id;
        inner.records.push(MessageRecord {
            id,
            timestamp: timestamp.to_string(),
            message: message.to_string(),
        });
        Ok(id)
    }

    fn recent_records(&self, limit: usize) -> Result<Vec<MessageRecord>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.records.iter().rev().take(limit).cloned().collect())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
