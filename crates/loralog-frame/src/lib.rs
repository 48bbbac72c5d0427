//! Line framing for chunked modem byte streams.
//!
//! Radio modems emit text lines terminated by `\n`, `\r`, `\r\n` or `\n\r`,
//! and serial reads cut that stream at arbitrary points. This crate turns
//! those chunks back into whole lines:
//! - [`LineFramer`] is fed chunks and yields decoded lines lazily
//! - [`LineReader`] pulls chunks from any `std::io::Read`
//! - `LineCodec` (behind the `async` feature) plugs into `tokio_util::codec`
//!
//! Framing never fails on content. Invalid UTF-8 is replaced, not rejected.

pub mod codec;
pub mod error;
pub mod framer;
pub mod reader;

#[cfg(feature = "async")]
pub use codec::LineCodec;
pub use codec::{find_terminator, terminator_len, CR, LF};
pub use error::{FrameError, Result};
pub use framer::{FramerConfig, LineFramer, Lines};
pub use reader::LineReader;
