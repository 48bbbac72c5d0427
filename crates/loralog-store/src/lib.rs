//! Persistent message history.
//!
//! The store is the only state shared between the single ingestion thread
//! and the many concurrent readers. Every backend here is safe to call from
//! any number of threads at once:
//! - [`SqliteStore`] opens one short-lived connection per call
//! - [`MemoryStore`] guards a `Vec` with a read/write lock

pub mod error;
pub mod memory;
pub mod record;
pub mod sqlite;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use record::{MessageRecord, MessageStore};
pub use sqlite::{SqliteStore, DEFAULT_BUSY_TIMEOUT, DEFAULT_DATABASE};
