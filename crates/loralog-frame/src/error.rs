/// Errors that can occur while pulling lines from a byte source.
///
/// Decoding itself never fails; these only cover the source feeding the
/// framer.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An I/O error occurred while reading bytes.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source reached end of stream with nothing left to yield.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
