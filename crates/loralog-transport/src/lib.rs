//! Chunked byte transport for serial-attached radio modems.
//!
//! Provides a unified interface over byte sources that deliver data in
//! chunks of arbitrary size and timing:
//! - Serial devices (USB/UART LoRa modems)
//!
//! This is the lowest layer of loralog. Everything else builds on top of
//! the [`ChunkSource`] trait provided here.

pub mod error;
pub mod serial;
pub mod traits;

pub use error::{Result, TransportError};
pub use serial::{SerialConfig, SerialTransport};
pub use traits::{ChunkSource, TransportGuard};
