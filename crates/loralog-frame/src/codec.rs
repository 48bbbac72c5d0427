use bytes::{Buf, BytesMut};

/// Line feed.
pub const LF: u8 = b'\n';
/// Carriage return.
pub const CR: u8 = b'\r';

/// Offset of the earliest `\n` or `\r` in `buf`.
pub fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == LF || b == CR)
}

/// Width of the terminator starting at `at`.
///
/// `\r\n` and `\n\r` count as one 2-byte terminator; anything else is a
/// single byte. Only the bytes present in `buf` are considered.
pub fn terminator_len(buf: &[u8], at: usize) -> usize {
    match buf.get(at..at + 2) {
        Some(b"\r\n") | Some(b"\n\r") => 2,
        _ => 1,
    }
}

fn pair_of(terminator: u8) -> u8 {
    if terminator == CR {
        LF
    } else {
        CR
    }
}

/// Split the next raw line off the front of `buf`.
///
/// `pending` remembers a lone terminator that was the last buffered byte
/// when its line was split off. If the next byte to arrive completes the
/// pair, it is dropped instead of being read as an empty line, so a `\r\n`
/// cut between two chunks still counts once.
///
/// Returns `None` when `buf` holds no terminator; the remaining bytes are
/// left in place.
pub(crate) fn split_line(buf: &mut BytesMut, pending: &mut Option<u8>) -> Option<BytesMut> {
    if let Some(prev) = pending.take() {
        match buf.first() {
            Some(&next) if next == pair_of(prev) => buf.advance(1),
            Some(_) => {}
            None => {
                *pending = Some(prev);
                return None;
            }
        }
    }

    let at = find_terminator(buf)?;
    let width = terminator_len(buf, at);
    if width == 1 && at + 1 == buf.len() {
        *pending = Some(buf[at]);
    }

    let raw = buf.split_to(at);
    buf.advance(width);
    Some(raw)
}

/// Decode raw line bytes, replacing invalid UTF-8 with U+FFFD.
pub(crate) fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

/// `tokio_util` decoder with the same terminator rules as
/// [`LineFramer`](crate::LineFramer).
///
/// At end of stream any unterminated remainder is yielded as a last line.
#[cfg(feature = "async")]
#[derive(Debug, Default)]
pub struct LineCodec {
    pending: Option<u8>,
}

#[cfg(feature = "async")]
impl LineCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "async")]
impl tokio_util::codec::Decoder for LineCodec {
    type Item = String;
    type Error = crate::error::FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        Ok(split_line(src, &mut self.pending).map(|raw| decode_line(&raw)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }
        let rest = src.split_to(src.len());
        Ok(Some(decode_line(&rest)))
    }
}
