//! LoRa serial listener with persistent message history.
//!
//! Bytes arrive from a serial-attached radio in arbitrary chunks. They are
//! framed into text lines, stamped, persisted, and served back newest-first
//! over a small HTTP API.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial port access behind the `ChunkSource` seam
//! - [`frame`]: incremental line framing over CR, LF, CRLF and LFCR
//! - [`store`]: message history (SQLite and in-memory)
//! - [`service`]: the ingestion pipeline and the query service
//! - [`api`]: HTTP routes and dashboard (behind `api` feature)

/// Re-export transport types.
pub mod transport {
    pub use loralog_transport::*;
}

/// Re-export framing types.
pub mod frame {
    pub use loralog_frame::*;
}

/// Re-export store types.
pub mod store {
    pub use loralog_store::*;
}

/// Re-export ingestion and query types.
pub mod service {
    pub use loralog_service::*;
}

/// Re-export HTTP API types (requires `api` feature).
#[cfg(feature = "api")]
pub mod api {
    pub use loralog_api::*;
}
