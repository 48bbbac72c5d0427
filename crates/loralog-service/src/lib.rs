//! Ingestion pipeline and recent-message queries.
//!
//! This is the layer that wires everything together. One long-lived thread
//! drives [`IngestPipeline`]: it reads chunks from a transport, frames them,
//! stamps each line and appends it to the store. Any number of callers use
//! [`QueryService`] at the same time to read the newest records back.
//!
//! The two sides share nothing but the store.

pub mod clock;
pub mod error;
pub mod ingest;
pub mod query;
pub mod shutdown;
pub mod sink;

pub use clock::{Clock, SystemClock};
pub use error::QueryError;
pub use ingest::{IngestConfig, IngestPipeline, IngestReport, IngestStats, Message, StopReason};
pub use query::{QueryOutcome, QueryService, DEFAULT_LIMIT};
pub use shutdown::Shutdown;
pub use sink::{ConsoleSink, MessageSink};
