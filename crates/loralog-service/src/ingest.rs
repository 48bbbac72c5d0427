use std::thread::JoinHandle;

use loralog_frame::{FramerConfig, LineFramer};
use loralog_store::MessageStore;
use loralog_transport::{ChunkSource, TransportError, TransportGuard};
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::shutdown::Shutdown;
use crate::sink::MessageSink;

/// A framed line stamped with the time the pipeline extracted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub timestamp: String,
}

/// Ingestion behaviour.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestConfig {
    /// Framer limits.
    pub framer: FramerConfig,
    /// Do not persist empty lines (they are still framed and mirrored).
    pub skip_empty: bool,
}

/// Counters kept across the pipeline's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Non-empty chunks read from the transport.
    pub chunks: u64,
    /// Lines produced by the framer.
    pub messages: u64,
    /// Lines stored successfully.
    pub persisted: u64,
    /// Lines the store rejected (dropped, not retried).
    pub failed: u64,
    /// Empty lines left out under `skip_empty`.
    pub skipped: u64,
}

/// Why the ingestion loop ended.
#[derive(Debug)]
pub enum StopReason {
    /// A shutdown was requested.
    Shutdown,
    /// Reading from the transport failed.
    TransportFailed(TransportError),
}

/// Outcome of [`IngestPipeline::run`].
#[derive(Debug)]
pub struct IngestReport {
    pub stats: IngestStats,
    pub stop: StopReason,
}

/// The producer side: transport → framer → store.
///
/// Owns the framer outright, so the carry buffer is only ever touched by the
/// thread running the pipeline.
pub struct IngestPipeline<S> {
    store: S,
    framer: LineFramer,
    sink: Option<Box<dyn MessageSink + Send>>,
    clock: Box<dyn Clock + Send>,
    config: IngestConfig,
    stats: IngestStats,
}

impl<S: MessageStore> IngestPipeline<S> {
    /// Create a pipeline with default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, IngestConfig::default())
    }

    /// Create a pipeline with explicit configuration.
    pub fn with_config(store: S, config: IngestConfig) -> Self {
        Self {
            store,
            framer: LineFramer::with_config(config.framer),
            sink: None,
            clock: Box::new(SystemClock),
            config,
            stats: IngestStats::default(),
        }
    }

    /// Mirror every framed message to `sink`.
    pub fn with_sink(mut self, sink: impl MessageSink + Send + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Override the timestamp source.
    pub fn with_clock(mut self, clock: impl Clock + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Counters so far.
    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Frame one chunk and handle every line it completes.
    ///
    /// Store failures are logged and the line is dropped; they never stop
    /// the lines after it. Returns the number of lines framed.
    pub fn ingest_chunk(&mut self, chunk: &[u8]) -> usize {
        let Self {
            store,
            framer,
            sink,
            clock,
            config,
            stats,
        } = self;

        let mut framed = 0;
        for text in framer.feed(chunk) {
            framed += 1;
            stats.messages += 1;
            let message = Message {
                text,
                timestamp: clock.now(),
            };

            if let Some(sink) = sink.as_mut() {
                sink.emit(&message);
            }

            if config.skip_empty && message.text.is_empty() {
                stats.skipped += 1;
                continue;
            }

            match store.append(&message.text, &message.timestamp) {
                Ok(id) => {
                    stats.persisted += 1;
                    debug!(id, len = message.text.len(), "message persisted");
                }
                Err(err) => {
                    stats.failed += 1;
                    warn!(error = %err, "failed to persist message; dropping it");
                }
            }
        }
        framed
    }

    /// Drive the pipeline until shutdown or a transport failure.
    ///
    /// The transport is closed before this returns, whichever way the loop
    /// ends.
    pub fn run<T: ChunkSource>(&mut self, transport: T, shutdown: &Shutdown) -> IngestReport {
        let mut transport = TransportGuard::new(transport);
        info!(
            transport = transport.get_ref().name(),
            backend = self.store.backend(),
            "ingestion started"
        );

        let stop = loop {
            if shutdown.is_triggered() {
                break StopReason::Shutdown;
            }
            match transport.read_chunk() {
                Ok(chunk) => {
                    if !chunk.is_empty() {
                        self.stats.chunks += 1;
                    }
                    self.ingest_chunk(&chunk);
                }
                Err(err) => {
                    error!(error = %err, "transport read failed; stopping ingestion");
                    break StopReason::TransportFailed(err);
                }
            }
        };
        drop(transport);

        let stats = self.stats;
        info!(
            messages = stats.messages,
            persisted = stats.persisted,
            failed = stats.failed,
            buffered = self.framer.buffered(),
            "ingestion stopped"
        );
        IngestReport { stats, stop }
    }
}

impl<S: MessageStore + 'static> IngestPipeline<S> {
    /// Run the pipeline on its own named thread.
    pub fn spawn<T>(
        mut self,
        transport: T,
        shutdown: Shutdown,
    ) -> std::io::Result<JoinHandle<IngestReport>>
    where
        T: ChunkSource + Send + 'static,
    {
        std::thread::Builder::new()
            .name("loralog-ingest".to_string())
            .spawn(move || self.run(transport, &shutdown))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use bytes::Bytes;
    use loralog_store::{MemoryStore, MessageRecord, StoreError};

    use super::*;

    struct ScriptedSource {
        chunks: VecDeque<&'static [u8]>,
        closes: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        fn new(chunks: &[&'static [u8]]) -> (Self, Arc<AtomicUsize>) {
            let closes = Arc::new(AtomicUsize::new(0));
            let source = Self {
                chunks: chunks.iter().copied().collect(),
                closes: Arc::clone(&closes),
            };
            (source, closes)
        }
    }

    impl ChunkSource for ScriptedSource {
        fn read_chunk(&mut self) -> loralog_transport::Result<Bytes> {
            self.chunks
                .pop_front()
                .map(Bytes::from_static)
                .ok_or_else(|| {
                    TransportError::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
                })
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    /// Rejects the appends whose 1-based position is listed.
    struct FlakyStore {
        inner: MemoryStore,
        calls: AtomicUsize,
        fail_on: Vec<usize>,
    }

    impl MessageStore for FlakyStore {
        fn append(&self, message: &str, timestamp: &str) -> loralog_store::Result<i64> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on.contains(&call) {
                return Err(StoreError::Unavailable("disk full".to_string()));
            }
            self.inner.append(message, timestamp)
        }

        fn recent_records(&self, limit: usize) -> loralog_store::Result<Vec<MessageRecord>> {
            self.inner.recent_records(limit)
        }

        fn backend(&self) -> &'static str {
            "flaky"
        }
    }

    struct Collect(Arc<Mutex<Vec<Message>>>);

    impl MessageSink for Collect {
        fn emit(&mut self, message: &Message) {
            self.0.lock().unwrap().push(message.clone());
        }
    }

    fn counter_clock() -> impl Fn() -> String + Send + 'static {
        let tick = AtomicUsize::new(0);
        move || format!("t{}", tick.fetch_add(1, Ordering::SeqCst))
    }

    fn texts(store: &MemoryStore) -> Vec<String> {
        let mut records = store.recent_records(usize::MAX).unwrap();
        records.reverse();
        records.into_iter().map(|r| r.message).collect()
    }

    #[test]
    fn frames_stamps_and_persists_in_order() {
        let store = Arc::new(MemoryStore::new());
        let mut pipeline = IngestPipeline::new(Arc::clone(&store)).with_clock(counter_clock());

        assert_eq!(pipeline.ingest_chunk(b"AB\r"), 1);
        assert_eq!(pipeline.ingest_chunk(b"\nCD\n"), 1);
        assert_eq!(pipeline.ingest_chunk(b""), 0);

        let records = store.recent_records(10).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "CD");
        assert_eq!(records[0].timestamp, "t1");
        assert_eq!(records[1].message, "AB");
        assert_eq!(records[1].timestamp, "t0");
    }

    #[test]
    fn store_failure_does_not_stop_later_messages() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            calls: AtomicUsize::new(0),
            fail_on: vec![2],
        });
        let mut pipeline = IngestPipeline::new(Arc::clone(&store));

        assert_eq!(pipeline.ingest_chunk(b"one\ntwo\nthree\n"), 3);
        pipeline.ingest_chunk(b"four\n");

        assert_eq!(texts(&store.inner), vec!["one", "three", "four"]);
        let stats = pipeline.stats();
        assert_eq!(stats.messages, 4);
        assert_eq!(stats.persisted, 3);
        assert_eq!(stats.failed, 1);
    }

    #[test]
    fn empty_lines_are_persisted_by_default() {
        let store = Arc::new(MemoryStore::new());
        let mut pipeline = IngestPipeline::new(Arc::clone(&store));
        pipeline.ingest_chunk(b"\r\n\r\nX");
        assert_eq!(texts(&store), vec!["", ""]);
    }

    #[test]
    fn skip_empty_still_mirrors() {
        let store = Arc::new(MemoryStore::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let config = IngestConfig {
            skip_empty: true,
            ..IngestConfig::default()
        };
        let mut pipeline = IngestPipeline::with_config(Arc::clone(&store), config)
            .with_sink(Collect(Arc::clone(&seen)));

        pipeline.ingest_chunk(b"\nhi\n");

        assert_eq!(texts(&store), vec!["hi"]);
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert_eq!(pipeline.stats().skipped, 1);
    }

    #[test]
    fn run_stops_on_transport_failure_and_closes() {
        let store = Arc::new(MemoryStore::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (source, closes) = ScriptedSource::new(&[b"he", b"", b"llo\r", b"\nworld\n"]);
        let mut pipeline =
            IngestPipeline::new(Arc::clone(&store)).with_sink(Collect(Arc::clone(&seen)));

        let report = pipeline.run(source, &Shutdown::new());

        assert!(matches!(report.stop, StopReason::TransportFailed(_)));
        assert_eq!(report.stats.chunks, 3);
        assert_eq!(report.stats.persisted, 2);
        assert_eq!(texts(&store), vec!["hello", "world"]);
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        let mirrored: Vec<_> = seen.lock().unwrap().iter().map(|m| m.text.clone()).collect();
        assert_eq!(mirrored, vec!["hello", "world"]);
    }

    #[test]
    fn run_exits_on_shutdown_and_closes() {
        struct StopAfterFirst {
            shutdown: Shutdown,
            closes: Arc<AtomicUsize>,
        }

        impl ChunkSource for StopAfterFirst {
            fn read_chunk(&mut self) -> loralog_transport::Result<Bytes> {
                self.shutdown.trigger();
                Ok(Bytes::from_static(b"last\n"))
            }

            fn close(&mut self) {
                self.closes.fetch_add(1, Ordering::SeqCst);
            }
        }

        let store = Arc::new(MemoryStore::new());
        let shutdown = Shutdown::new();
        let closes = Arc::new(AtomicUsize::new(0));
        let source = StopAfterFirst {
            shutdown: shutdown.clone(),
            closes: Arc::clone(&closes),
        };

        let report = IngestPipeline::new(Arc::clone(&store)).run(source, &shutdown);

        assert!(matches!(report.stop, StopReason::Shutdown));
        assert_eq!(texts(&store), vec!["last"]);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn already_triggered_shutdown_reads_nothing() {
        let store = Arc::new(MemoryStore::new());
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let (source, closes) = ScriptedSource::new(&[b"never\n"]);

        let report = IngestPipeline::new(Arc::clone(&store)).run(source, &shutdown);

        assert!(matches!(report.stop, StopReason::Shutdown));
        assert_eq!(report.stats, IngestStats::default());
        assert!(store.is_empty());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn spawned_pipeline_reports_back() {
        let store = Arc::new(MemoryStore::new());
        let (source, closes) = ScriptedSource::new(&[b"a\nb\n"]);

        let handle = IngestPipeline::new(Arc::clone(&store))
            .spawn(source, Shutdown::new())
            .unwrap();
        let report = handle.join().unwrap();

        assert_eq!(report.stats.persisted, 2);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
