use std::io::Write;

use tracing::debug;

use crate::ingest::Message;

/// Observer for every framed message, e.g. a console mirror.
pub trait MessageSink {
    fn emit(&mut self, message: &Message);
}

/// Writes each message text on its own line and flushes immediately.
#[derive(Debug)]
pub struct ConsoleSink<W> {
    out: W,
}

impl ConsoleSink<std::io::Stdout> {
    /// Mirror to standard output.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MessageSink for ConsoleSink<W> {
    fn emit(&mut self, message: &Message) {
        let written = writeln!(self.out, "{}", message.text).and_then(|_| self.out.flush());
        if let Err(err) = written {
            debug!(error = %err, "console mirror write failed");
        }
    }
}
