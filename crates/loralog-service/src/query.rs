use std::sync::Arc;

use loralog_store::{MessageRecord, MessageStore};
use tracing::{debug, warn};

use crate::error::{QueryError, Result};

/// Number of records returned when the caller does not ask for a limit.
pub const DEFAULT_LIMIT: i64 = 100;

/// The consumer side: answers "newest N messages" from the store.
///
/// Cheap to clone and safe to call from any number of threads or tasks at
/// once. Calls are independent reads; nothing here coordinates with the
/// ingestion thread beyond what the store does per call.
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn MessageStore>,
}

/// Records plus an explicit failure marker.
///
/// `records` is empty whenever `error` is set.
#[derive(Debug)]
pub struct QueryOutcome {
    pub records: Vec<MessageRecord>,
    pub error: Option<QueryError>,
}

impl QueryOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl QueryService {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// Up to `limit` records, highest identifier first.
    ///
    /// `limit` must be positive; anything else is rejected before the store
    /// is touched. No upper bound is applied here.
    pub fn recent(&self, limit: i64) -> Result<Vec<MessageRecord>> {
        if limit <= 0 {
            return Err(QueryError::InvalidLimit(limit));
        }
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        match self.store.recent_records(limit) {
            Ok(records) => {
                debug!(limit, returned = records.len(), "recent messages served");
                Ok(records)
            }
            Err(err) => {
                warn!(error = %err, limit, "recent messages query failed");
                Err(QueryError::Store(err))
            }
        }
    }

    /// [`recent`](Self::recent) with [`DEFAULT_LIMIT`].
    pub fn latest(&self) -> Result<Vec<MessageRecord>> {
        self.recent(DEFAULT_LIMIT)
    }

    /// Like [`recent`](Self::recent), but never fails: errors come back as
    /// an empty record list with the error attached.
    pub fn recent_or_empty(&self, limit: i64) -> QueryOutcome {
        match self.recent(limit) {
            Ok(records) => QueryOutcome {
                records,
                error: None,
            },
            Err(err) => QueryOutcome {
                records: Vec::new(),
                error: Some(err),
            },
        }
    }

    /// Backend name of the underlying store.
    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }
}

impl std::fmt::Debug for QueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryService")
            .field("backend", &self.store.backend())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use loralog_store::{MemoryStore, StoreError};

    use super::*;
    use crate::ingest::IngestPipeline;

    struct CountingStore {
        inner: MemoryStore,
        reads: AtomicUsize,
    }

    impl MessageStore for CountingStore {
        fn append(&self, message: &str, timestamp: &str) -> loralog_store::Result<i64> {
            self.inner.append(message, timestamp)
        }

        fn recent_records(&self, limit: usize) -> loralog_store::Result<Vec<MessageRecord>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.recent_records(limit)
        }

        fn backend(&self) -> &'static str {
            "counting"
        }
    }

    struct BrokenStore;

    impl MessageStore for BrokenStore {
        fn append(&self, _: &str, _: &str) -> loralog_store::Result<i64> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        fn recent_records(&self, _: usize) -> loralog_store::Result<Vec<MessageRecord>> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        fn backend(&self) -> &'static str {
            "broken"
        }
    }

    fn seeded(n: usize) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for i in 0..n {
            store.append(&format!("m{i}"), "ts").unwrap();
        }
        store
    }

    #[test]
    fn non_positive_limit_is_rejected_without_store_access() {
        let store = Arc::new(CountingStore {
            inner: MemoryStore::new(),
            reads: AtomicUsize::new(0),
        });
        let service = QueryService::new(store.clone());

        assert!(matches!(service.recent(0), Err(QueryError::InvalidLimit(0))));
        assert!(matches!(
            service.recent(-5),
            Err(QueryError::InvalidLimit(-5))
        ));
        assert_eq!(store.reads.load(Ordering::SeqCst), 0);

        service.recent(1).unwrap();
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn returns_at_most_limit_newest_first() {
        let service = QueryService::new(seeded(5));
        let records = service.recent(3).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.windows(2).all(|w| w[0].id > w[1].id));
        assert_eq!(records[0].message, "m4");

        assert_eq!(service.recent(i64::MAX).unwrap().len(), 5);
    }

    #[test]
    fn default_limit_is_one_hundred() {
        let service = QueryService::new(seeded(150));
        assert_eq!(service.latest().unwrap().len(), 100);
    }

    #[test]
    fn empty_store_is_not_an_error() {
        let service = QueryService::new(Arc::new(MemoryStore::new()));
        assert!(service.recent(10).unwrap().is_empty());
    }

    #[test]
    fn latest_append_comes_back_first() {
        let store = seeded(3);
        let service = QueryService::new(store.clone());
        let id = store.append("fresh", "now").unwrap();

        let first = &service.recent(1).unwrap()[0];
        assert_eq!(first.id, id);
        assert_eq!(first.message, "fresh");
    }

    #[test]
    fn store_failure_is_reported_not_hidden() {
        let service = QueryService::new(Arc::new(BrokenStore));
        assert!(matches!(service.recent(10), Err(QueryError::Store(_))));

        let outcome = service.recent_or_empty(10);
        assert!(!outcome.is_ok());
        assert!(outcome.records.is_empty());

        // Still usable afterwards.
        assert!(matches!(service.recent(0), Err(QueryError::InvalidLimit(0))));
    }

    #[test]
    fn queries_run_alongside_ingestion() {
        let store = Arc::new(MemoryStore::new());
        let service = QueryService::new(store.clone());

        let writer = std::thread::spawn({
            let store = store.clone();
            move || {
                let mut pipeline = IngestPipeline::new(store);
                for i in 0..200 {
                    pipeline.ingest_chunk(format!("line-{i}\r\n").as_bytes());
                }
                pipeline.stats()
            }
        });

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let records = service.recent(20).unwrap();
                        assert!(records.len() <= 20);
                        assert!(records.windows(2).all(|w| w[0].id > w[1].id));
                    }
                })
            })
            .collect();

        let stats = writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        assert_eq!(stats.persisted, 200);
        assert_eq!(service.recent(1).unwrap()[0].message, "line-199");
    }
}
