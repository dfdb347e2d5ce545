//! Buffered byte source with offset tracking
//!
//! Running out of input between tokens is a clean end of stream; running out
//! inside one is [`DlogError::TruncatedStream`].

use std::io::{ErrorKind, Read};

use dlog_format::varint::Uleb128Decoder;
use dlog_format::{DlogError, Result};

const CHUNK_SIZE: usize = 8 * 1024;

/// Byte-at-a-time reader over any [`Read`]
pub struct ByteSource<R: Read> {
    reader: R,
    buf: Box<[u8]>,
    pos: usize,
    filled: usize,
    offset: u64,
}

impl<R: Read> ByteSource<R> {
    /// Wrap `reader`, counting offsets from 0
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: vec![0u8; CHUNK_SIZE].into_boxed_slice(),
            pos: 0,
            filled: 0,
            offset: 0,
        }
    }

    /// Offset of the next byte to be read
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Next byte, or `None` at end of input
    pub fn next_byte(&mut self) -> Result<Option<u8>> {
        if self.pos == self.filled && !self.fill()? {
            return Ok(None);
        }
        let byte = self.buf[self.pos];
        self.pos += 1;
        self.offset += 1;
        Ok(Some(byte))
    }

    /// Next byte inside a token; end of input is truncation
    pub fn require_byte(&mut self) -> Result<u8> {
        self.next_byte()?.ok_or(DlogError::TruncatedStream)
    }

    /// Read one ULEB128 varint
    pub fn read_varint(&mut self) -> Result<u64> {
        let mut decoder = Uleb128Decoder::new();
        loop {
            let byte = self.require_byte()?;
            if let Some(value) = decoder.push(byte)? {
                return Ok(value);
            }
        }
    }

    /// Read exactly `N` bytes
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        for slot in out.iter_mut() {
            *slot = self.require_byte()?;
        }
        Ok(out)
    }

    /// Read exactly `len` bytes. Growth is incremental so a corrupt length
    /// fails on truncation instead of one huge allocation.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(len.min(CHUNK_SIZE));
        while out.len() < len {
            if self.pos == self.filled && !self.fill()? {
                return Err(DlogError::TruncatedStream);
            }
            let take = (len - out.len()).min(self.filled - self.pos);
            out.extend_from_slice(&self.buf[self.pos..self.pos + take]);
            self.pos += take;
            self.offset += take as u64;
        }
        Ok(out)
    }

    /// Discard exactly `len` bytes
    pub fn skip(&mut self, len: u64) -> Result<()> {
        let mut remaining = len;
        while remaining > 0 {
            if self.pos == self.filled && !self.fill()? {
                return Err(DlogError::TruncatedStream);
            }
            let available = (self.filled - self.pos) as u64;
            let take = remaining.min(available);
            self.pos += take as usize;
            self.offset += take;
            remaining -= take;
        }
        Ok(())
    }

    /// Consume the source, returning the underlying reader
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn fill(&mut self) -> Result<bool> {
        loop {
            match self.reader.read(&mut self.buf) {
                Ok(0) => return Ok(false),
                Ok(n) => {
                    self.pos = 0;
                    self.filled = n;
                    return Ok(true);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_offsets_advance_per_byte() {
        let mut source = ByteSource::new(Cursor::new(vec![1u8, 2, 3]));
        assert_eq!(source.offset(), 0);
        assert_eq!(source.next_byte().unwrap(), Some(1));
        assert_eq!(source.offset(), 1);
        assert_eq!(source.read_array::<2>().unwrap(), [2, 3]);
        assert_eq!(source.offset(), 3);
        assert_eq!(source.next_byte().unwrap(), None);
    }

    #[test]
    fn test_read_varint_truncated() {
        let mut source = ByteSource::new(Cursor::new(vec![0x80u8, 0x80]));
        assert!(matches!(
            source.read_varint(),
            Err(DlogError::TruncatedStream)
        ));
    }

    #[test]
    fn test_read_bytes_across_chunks() {
        let data: Vec<u8> = (0..(CHUNK_SIZE * 2 + 17)).map(|i| i as u8).collect();
        let mut source = ByteSource::new(Cursor::new(data.clone()));
        source.skip(5).unwrap();
        let bytes = source.read_bytes(CHUNK_SIZE * 2).unwrap();
        assert_eq!(bytes.as_slice(), &data[5..5 + CHUNK_SIZE * 2]);
        assert_eq!(source.offset(), (CHUNK_SIZE * 2 + 5) as u64);
    }

    #[test]
    fn test_read_bytes_truncated() {
        let mut source = ByteSource::new(Cursor::new(vec![1u8, 2, 3]));
        assert!(matches!(
            source.read_bytes(10),
            Err(DlogError::TruncatedStream)
        ));
    }

    #[test]
    fn test_skip_past_end_is_truncation() {
        let mut source = ByteSource::new(Cursor::new(vec![1u8, 2, 3]));
        assert!(matches!(source.skip(4), Err(DlogError::TruncatedStream)));
    }
}
