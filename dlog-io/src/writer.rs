//! Streaming writer for dlog streams

use std::io::Write;

use dlog_codec::{EncodeOpts, FramerStats, RecordFramer};
use dlog_format::Result;
use serde_json::Value;

/// dlog writer.
///
/// The header and initial clear are written by [`DlogWriter::new`]; each
/// value is framed and handed to the inner writer immediately.
pub struct DlogWriter<W: Write> {
    writer: W,
    framer: RecordFramer,
    buffer: Vec<u8>,
}

impl<W: Write> DlogWriter<W> {
    /// Create a writer and emit the stream prelude
    pub fn new(writer: W, opts: EncodeOpts) -> Result<Self> {
        let mut this = Self {
            writer,
            framer: RecordFramer::new(opts),
            buffer: Vec::with_capacity(4096),
        };
        this.framer.start_stream(&mut this.buffer);
        this.drain()?;
        Ok(this)
    }

    /// Encode and write one value
    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        self.framer.frame_value(value, &mut self.buffer)?;
        self.drain()
    }

    /// Write a `C` record: later values see an empty dictionary
    pub fn clear_dictionary(&mut self) -> Result<()> {
        tracing::debug!(
            offset = self.framer.position(),
            entries = self.framer.interner().len(),
            "explicit dictionary clear"
        );
        self.framer.frame_clear(&mut self.buffer);
        self.drain()
    }

    /// Bytes written so far
    pub fn position(&self) -> u64 {
        self.framer.position()
    }

    /// Framing counters so far
    pub fn stats(&self) -> &FramerStats {
        self.framer.stats()
    }

    /// Flush and return the inner writer with the final counters
    pub fn finish(mut self) -> Result<(W, FramerStats)> {
        self.writer.flush()?;
        Ok((self.writer, self.framer.stats().clone()))
    }

    fn drain(&mut self) -> Result<()> {
        self.writer.write_all(&self.buffer)?;
        self.buffer.clear();
        Ok(())
    }
}
