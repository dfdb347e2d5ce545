//! Record framer
//!
//! Wraps encoded payloads in `A`/`V` records, tracks the stream offset and
//! the offset of the last dictionary-affecting record (`last_dict`), and
//! decides when an epoch ends.

use dlog_format::constants::{FORMAT_VERSION, INTERN_CACHE_SIZE, INTERN_THRESH, MAX_NESTING_DEPTH};
use dlog_format::record::{
    write_add_record, write_clear_record, write_header_record, write_value_record,
};
use dlog_format::Result;
use serde::Serialize;
use serde_json::Value;

use crate::encoder::encode_value;
use crate::intern::StringInterner;

/// Encoder configuration
#[derive(Debug, Clone)]
pub struct EncodeOpts {
    /// Sightings a non-key string needs before it is promoted. The sighting
    /// that finds the count at the threshold promotes, so `0` behaves like `1`.
    pub intern_threshold: usize,
    /// Capacity of the usage tracker
    pub intern_cache_size: usize,
    /// Start a new epoch once the dictionary holds this many entries
    pub clear_threshold: Option<usize>,
    /// Also forget usage counts when an epoch ends
    pub reset_usage_on_clear: bool,
    /// Deepest array/object nesting a value may have
    pub max_nesting_depth: usize,
}

impl Default for EncodeOpts {
    fn default() -> Self {
        Self {
            intern_threshold: INTERN_THRESH,
            intern_cache_size: INTERN_CACHE_SIZE,
            clear_threshold: None,
            reset_usage_on_clear: false,
            max_nesting_depth: MAX_NESTING_DEPTH,
        }
    }
}

/// Counters maintained while framing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FramerStats {
    /// `V` records written
    pub value_records: u64,
    /// `A` records written
    pub add_records: u64,
    /// `C` records written, including the one opening the stream
    pub clear_records: u64,
    /// Strings announced in `A` records
    pub strings_interned: u64,
    /// Total bytes framed so far
    pub bytes_framed: u64,
}

/// Encoder state for one stream.
///
/// Owns the dictionary; two framers never share interning state.
#[derive(Debug)]
pub struct RecordFramer {
    opts: EncodeOpts,
    interner: StringInterner,
    position: u64,
    last_dict: u64,
    payload: Vec<u8>,
    started: bool,
    stats: FramerStats,
}

impl RecordFramer {
    /// Create a framer positioned at offset 0
    pub fn new(opts: EncodeOpts) -> Self {
        let interner = StringInterner::new(opts.intern_threshold, opts.intern_cache_size);
        Self {
            opts,
            interner,
            position: 0,
            last_dict: 0,
            payload: Vec::new(),
            started: false,
            stats: FramerStats::default(),
        }
    }

    /// Emit the `H` record and the opening `C` record. Idempotent.
    pub fn start_stream(&mut self, out: &mut Vec<u8>) {
        if self.started {
            return;
        }
        self.started = true;

        let start = out.len();
        write_header_record(out, FORMAT_VERSION);
        self.advance(out.len() - start);

        self.frame_clear(out);
    }

    /// Encode `value` and append its records (`A` if needed, then `V`)
    pub fn frame_value(&mut self, value: &Value, out: &mut Vec<u8>) -> Result<()> {
        self.start_stream(out);

        if let Some(limit) = self.opts.clear_threshold {
            if self.interner.len() >= limit {
                tracing::debug!(
                    entries = self.interner.len(),
                    limit,
                    offset = self.position,
                    "dictionary reached clear threshold, starting new epoch"
                );
                self.frame_clear(out);
            }
        }

        self.payload.clear();
        encode_value(
            value,
            &mut self.interner,
            self.opts.max_nesting_depth,
            &mut self.payload,
        )?;

        if self.interner.has_pending() {
            let start = out.len();
            let backlink = self.position - self.last_dict;
            write_add_record(
                out,
                backlink,
                self.interner.pending().iter().map(String::as_str),
            );
            let added = self.interner.mark_flushed();
            tracing::debug!(
                offset = self.position,
                backlink,
                added,
                dictionary = self.interner.len(),
                "flushed dictionary additions"
            );
            self.last_dict = self.position;
            self.stats.add_records += 1;
            self.stats.strings_interned += added as u64;
            self.advance(out.len() - start);
        }

        let start = out.len();
        let backlink = self.position - self.last_dict;
        write_value_record(out, backlink, &self.payload);
        tracing::trace!(
            offset = self.position,
            backlink,
            payload_len = self.payload.len(),
            "framed value record"
        );
        self.stats.value_records += 1;
        self.advance(out.len() - start);

        Ok(())
    }

    /// Append a `C` record and start a new epoch
    pub fn frame_clear(&mut self, out: &mut Vec<u8>) {
        let start = out.len();
        write_clear_record(out);
        self.interner.clear(self.opts.reset_usage_on_clear);
        self.last_dict = self.position;
        self.stats.clear_records += 1;
        self.advance(out.len() - start);
    }

    /// Bytes framed so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Offset of the last `C` or `A` record
    pub fn last_dict(&self) -> u64 {
        self.last_dict
    }

    /// Current dictionary
    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    /// Counters so far
    pub fn stats(&self) -> &FramerStats {
        &self.stats
    }

    /// Options this framer was built with
    pub fn opts(&self) -> &EncodeOpts {
        &self.opts
    }

    fn advance(&mut self, written: usize) {
        self.position += written as u64;
        self.stats.bytes_framed = self.position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stream_prelude() {
        let mut framer = RecordFramer::new(EncodeOpts::default());
        let mut out = Vec::new();
        framer.start_stream(&mut out);
        framer.start_stream(&mut out);
        assert_eq!(out, b"HI\x01E\nCE\n");
        assert_eq!(framer.position(), 8);
        assert_eq!(framer.last_dict(), 5);
        assert_eq!(framer.stats().clear_records, 1);
    }

    #[test]
    fn test_first_value_emits_add_then_value() {
        let mut framer = RecordFramer::new(EncodeOpts::default());
        let mut out = Vec::new();
        framer.frame_value(&json!({"a": 1}), &mut out).unwrap();

        let mut expected = b"HI\x01E\nCE\n".to_vec();
        // A at offset 8, backlink 8 - 5
        expected.extend_from_slice(b"A\x03S\x01aE\n");
        // V at offset 15, backlink 15 - 8
        expected.extend_from_slice(b"V\x07\x06{X\x00I\x01}E\n");
        assert_eq!(out, expected);
        assert_eq!(framer.last_dict(), 8);
        assert_eq!(framer.position(), out.len() as u64);
    }

    #[test]
    fn test_value_without_new_strings_skips_add() {
        let mut framer = RecordFramer::new(EncodeOpts::default());
        let mut out = Vec::new();
        framer.frame_value(&json!({"a": 1}), &mut out).unwrap();
        let before = out.len();
        framer.frame_value(&json!({"a": 2}), &mut out).unwrap();

        let second = &out[before..];
        assert_eq!(second[0], b'V');
        assert_eq!(framer.stats().add_records, 1);
        assert_eq!(framer.stats().value_records, 2);
        // backlink reaches back to the A record at offset 8
        assert_eq!(second[1] as usize, before - 8);
    }

    #[test]
    fn test_clear_threshold_starts_new_epoch() {
        let opts = EncodeOpts {
            clear_threshold: Some(2),
            ..EncodeOpts::default()
        };
        let mut framer = RecordFramer::new(opts);
        let mut out = Vec::new();
        framer.frame_value(&json!({"a": 1, "b": 2}), &mut out).unwrap();
        assert_eq!(framer.interner().len(), 2);

        let before = out.len();
        framer.frame_value(&json!({"c": 3}), &mut out).unwrap();
        assert_eq!(out[before], b'C');
        assert_eq!(framer.stats().clear_records, 2);
        assert_eq!(framer.interner().entries(), &["c".to_string()]);
    }

    #[test]
    fn test_explicit_clear_resets_dictionary() {
        let mut framer = RecordFramer::new(EncodeOpts::default());
        let mut out = Vec::new();
        framer.frame_value(&json!({"a": 1}), &mut out).unwrap();
        let clear_at = framer.position();
        framer.frame_clear(&mut out);
        assert!(framer.interner().is_empty());
        assert_eq!(framer.last_dict(), clear_at);
    }
}
