use std::io::{ErrorKind, Read};

use crate::error::{FrameError, Result};
use crate::framer::{FramerConfig, LineFramer};

const READ_CHUNK_SIZE: usize = 1024;

/// Reads complete lines from any `Read` source.
///
/// Handles partial reads internally; callers always get whole lines.
pub struct LineReader<T> {
    inner: T,
    framer: LineFramer,
    chunk: Vec<u8>,
}

impl<T: Read> LineReader<T> {
    /// Create a new line reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FramerConfig::default())
    }

    /// Create a new line reader with explicit configuration.
    pub fn with_config(inner: T, config: FramerConfig) -> Self {
        Self {
            inner,
            framer: LineFramer::with_config(config),
            chunk: vec![0u8; READ_CHUNK_SIZE],
        }
    }

    /// Read the next complete line (blocking).
    ///
    /// Returns `Ok(None)` when the source timed out with no complete line
    /// available. At end of stream an unterminated tail is returned as a
    /// last line, then `Err(FrameError::ConnectionClosed)`.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(line) = self.framer.lines().next() {
                return Ok(Some(line));
            }

            let read = match self.inner.read(&mut self.chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) =>
                {
                    return Ok(None)
                }
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return match self.framer.finish() {
                    Some(rest) => Ok(Some(rest)),
                    None => Err(FrameError::ConnectionClosed),
                };
            }

            self.framer.push(&self.chunk[..read]);
        }
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying source.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner source.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn read_all<R: Read>(reader: &mut LineReader<R>) -> Vec<String> {
        let mut out = Vec::new();
        loop {
            match reader.read_line() {
                Ok(Some(line)) => out.push(line),
                Ok(None) => continue,
                Err(FrameError::ConnectionClosed) => return out,
                Err(err) => panic!("unexpected error: {err}"),
            }
        }
    }

    #[test]
    fn reads_lines_from_cursor() {
        let mut reader = LineReader::new(Cursor::new(b"one\r\ntwo\nthree\r".to_vec()));
        assert_eq!(read_all(&mut reader), vec!["one", "two", "three"]);
    }

    #[test]
    fn unterminated_tail_is_returned_at_eof() {
        let mut reader = LineReader::new(Cursor::new(b"done\npartial".to_vec()));
        assert_eq!(read_all(&mut reader), vec!["done", "partial"]);
    }

    #[test]
    fn empty_source_is_closed() {
        let mut reader = LineReader::new(Cursor::new(Vec::<u8>::new()));
        assert!(matches!(
            reader.read_line(),
            Err(FrameError::ConnectionClosed)
        ));
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[test]
    fn partial_read_handling() {
        let mut reader = LineReader::new(ByteByByteReader {
            bytes: b"AB\r\nCD\n\r\r\n".to_vec(),
            pos: 0,
        });
        assert_eq!(read_all(&mut reader), vec!["AB", "CD", ""]);
    }

    struct Scripted {
        steps: Vec<std::io::Result<Vec<u8>>>,
    }

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.steps.is_empty() {
                return Ok(0);
            }
            let bytes = self.steps.remove(0)?;
            buf[..bytes.len()].copy_from_slice(&bytes);
            Ok(bytes.len())
        }
    }

    #[test]
    fn timeout_surfaces_as_none() {
        let mut reader = LineReader::new(Scripted {
            steps: vec![
                Ok(b"half".to_vec()),
                Err(std::io::Error::from(ErrorKind::TimedOut)),
                Ok(b"\n".to_vec()),
            ],
        });
        assert_eq!(reader.read_line().unwrap(), None);
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("half"));
    }

    #[test]
    fn interrupted_read_retries() {
        let mut reader = LineReader::new(Scripted {
            steps: vec![
                Err(std::io::Error::from(ErrorKind::Interrupted)),
                Ok(b"ok\n".to_vec()),
            ],
        });
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("ok"));
    }

    #[test]
    fn other_io_errors_propagate() {
        let mut reader = LineReader::new(Scripted {
            steps: vec![Err(std::io::Error::from(ErrorKind::BrokenPipe))],
        });
        let err = reader.read_line().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut reader = LineReader::new(Cursor::new(Vec::<u8>::new()));
        let _ = reader.get_ref();
        let _ = reader.get_mut();
        let _inner = reader.into_inner();
    }
}
