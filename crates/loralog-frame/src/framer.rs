use std::num::NonZeroUsize;

use bytes::{Buf, BytesMut};
use tracing::warn;

use crate::codec::{decode_line, split_line};

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Configuration for the line framer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FramerConfig {
    /// Maximum unterminated bytes kept between chunks. When exceeded, the
    /// oldest bytes are discarded. `None` (the default) never discards, so
    /// lines of any length come out whole however the input is split.
    pub max_buffer: Option<NonZeroUsize>,
}

/// Turns arbitrarily chunked bytes into complete text lines.
///
/// The carry buffer holds bytes that have arrived but do not yet end in a
/// terminator. It belongs to whoever owns the framer; nothing else ever sees
/// it, so no locking is involved.
#[derive(Debug)]
pub struct LineFramer {
    buf: BytesMut,
    pending: Option<u8>,
    config: FramerConfig,
}

impl LineFramer {
    /// Create a framer with default configuration.
    pub fn new() -> Self {
        Self::with_config(FramerConfig::default())
    }

    /// Create a framer with explicit configuration.
    pub fn with_config(config: FramerConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            pending: None,
            config,
        }
    }

    /// Create a framer holding at most `max_buffer` unterminated bytes.
    pub fn with_max_buffer(max_buffer: NonZeroUsize) -> Self {
        Self::with_config(FramerConfig {
            max_buffer: Some(max_buffer),
        })
    }

    /// Append `chunk` and iterate over every line it completes.
    ///
    /// Lines are decoded lazily as the iterator advances. An empty chunk
    /// yields nothing and leaves the buffer untouched. If the iterator is
    /// dropped early, the unread lines stay buffered for the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Lines<'_> {
        let done = chunk.is_empty();
        self.push(chunk);
        Lines {
            framer: self,
            done,
        }
    }

    /// Append `chunk` without extracting anything.
    pub fn push(&mut self, chunk: &[u8]) {
        if !chunk.is_empty() {
            self.buf.extend_from_slice(chunk);
        }
    }

    /// Iterate over lines already complete in the buffer.
    pub fn lines(&mut self) -> Lines<'_> {
        Lines {
            framer: self,
            done: false,
        }
    }

    /// Take whatever unterminated bytes remain as a final line.
    ///
    /// Used at end of stream. Returns `None` when nothing is buffered.
    pub fn finish(&mut self) -> Option<String> {
        self.pending = None;
        if self.buf.is_empty() {
            return None;
        }
        let rest = self.buf.split_to(self.buf.len());
        Some(decode_line(&rest))
    }

    /// Number of buffered bytes.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// The buffered bytes themselves.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    /// Current framer configuration.
    pub fn config(&self) -> &FramerConfig {
        &self.config
    }

    fn next_line(&mut self) -> Option<String> {
        match split_line(&mut self.buf, &mut self.pending) {
            Some(raw) => Some(decode_line(&raw)),
            None => {
                self.enforce_limit();
                None
            }
        }
    }

    fn enforce_limit(&mut self) {
        let Some(max_buffer) = self.config.max_buffer else {
            return;
        };
        let (len, max_buffer) = (self.buf.len(), max_buffer.get());
        if len > max_buffer {
            let dropped = len - max_buffer;
            warn!(
                dropped,
                max_buffer, "no terminator within buffer limit; discarding oldest bytes"
            );
            self.buf.advance(dropped);
        }
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy sequence of lines produced by [`LineFramer::feed`].
pub struct Lines<'a> {
    framer: &'a mut LineFramer,
    done: bool,
}

impl Iterator for Lines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.done {
            return None;
        }
        let line = self.framer.next_line();
        if line.is_none() {
            self.done = true;
        }
        line
    }
}
