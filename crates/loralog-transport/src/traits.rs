use bytes::Bytes;
use tracing::debug;

use crate::error::Result;

/// A source of raw byte chunks.
///
/// Chunks carry no alignment to message boundaries. An empty chunk means
/// "no data available right now" and is not an error. Implementations must
/// bound every `read_chunk` call with a timeout so callers can observe
/// shutdown requests between reads.
pub trait ChunkSource {
    /// Read the next chunk (blocking for at most the configured timeout).
    fn read_chunk(&mut self) -> Result<Bytes>;

    /// Release the underlying device. Must be idempotent.
    fn close(&mut self);

    /// Transport name for diagnostics.
    fn name(&self) -> &str {
        "unknown"
    }
}

impl<T: ChunkSource + ?Sized> ChunkSource for Box<T> {
    fn read_chunk(&mut self) -> Result<Bytes> {
        (**self).read_chunk()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Scoped ownership of a [`ChunkSource`].
///
/// The wrapped source is closed when the guard is dropped, on every exit
/// path including unwinding.
pub struct TransportGuard<T: ChunkSource> {
    inner: T,
}

impl<T: ChunkSource> TransportGuard<T> {
    /// Take ownership of an open source.
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Read the next chunk from the guarded source.
    pub fn read_chunk(&mut self) -> Result<Bytes> {
        self.inner.read_chunk()
    }

    /// Borrow the guarded source.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the guarded source.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T: ChunkSource> Drop for TransportGuard<T> {
    fn drop(&mut self) {
        debug!(transport = self.inner.name(), "releasing transport");
        self.inner.close();
    }
}

impl<T: ChunkSource> std::fmt::Debug for TransportGuard<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportGuard")
            .field("transport", &self.inner.name())
            .finish()
    }
}
