//! Streaming reader for dlog streams

use std::io::Read;

use dlog_codec::{DecodeOpts, DecoderStats, RecordEntry, StreamDecoder};
use dlog_format::Result;
use serde_json::Value;

/// Streaming reader over a dlog stream.
///
/// Reads strictly front to back; the first error ends every stream handed
/// out by this reader.
pub struct DlogReader<R: Read> {
    decoder: StreamDecoder<R>,
    failed: bool,
}

impl<R: Read> DlogReader<R> {
    /// Create a reader. Nothing is read until the first value is requested.
    pub fn new(reader: R, opts: DecodeOpts) -> Self {
        Self {
            decoder: StreamDecoder::new(reader, opts),
            failed: false,
        }
    }

    /// Next value, or `None` at the end of the stream
    pub fn next_value(&mut self) -> Result<Option<Value>> {
        if self.failed {
            return Ok(None);
        }
        let result = self.decoder.next_value();
        self.failed = result.is_err();
        result
    }

    /// Next record with its offset and backlink
    pub fn next_record(&mut self, skip_values: bool) -> Result<Option<RecordEntry>> {
        if self.failed {
            return Ok(None);
        }
        let result = if skip_values {
            self.decoder.next_record_skipping_values()
        } else {
            self.decoder.next_record()
        };
        self.failed = result.is_err();
        result
    }

    /// Stream all values lazily
    pub fn values(&mut self) -> ValueStream<'_, R> {
        ValueStream { reader: self }
    }

    /// Stream all records lazily. With `skip_values`, `V` payloads are
    /// skipped by their declared length.
    pub fn records(&mut self, skip_values: bool) -> RecordStream<'_, R> {
        RecordStream {
            reader: self,
            skip_values,
        }
    }

    /// Dictionary of the current epoch
    pub fn dictionary(&self) -> &[String] {
        self.decoder.dictionary()
    }

    /// Decoding counters so far
    pub fn stats(&self) -> &DecoderStats {
        self.decoder.stats()
    }

    /// Consume the reader, returning the underlying source
    pub fn into_inner(self) -> R {
        self.decoder.into_inner()
    }
}

/// Lazy iterator over decoded values
pub struct ValueStream<'a, R: Read> {
    reader: &'a mut DlogReader<R>,
}

impl<R: Read> Iterator for ValueStream<'_, R> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_value().transpose()
    }
}

/// Lazy iterator over records
pub struct RecordStream<'a, R: Read> {
    reader: &'a mut DlogReader<R>,
    skip_values: bool,
}

impl<R: Read> Iterator for RecordStream<'_, R> {
    type Item = Result<RecordEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_record(self.skip_values).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlog_codec::{encode_values, EncodeOpts, Record};
    use dlog_format::DlogError;
    use serde_json::json;
    use std::io::Cursor;

    fn sample() -> Vec<u8> {
        let values = vec![json!({"a": 1}), json!({"a": 2}), json!([1, 2])];
        encode_values(&values, EncodeOpts::default()).unwrap()
    }

    #[test]
    fn test_values_stream() {
        let mut reader = DlogReader::new(Cursor::new(sample()), DecodeOpts::default());
        let values: Vec<Value> = reader.values().collect::<Result<_>>().unwrap();
        assert_eq!(values, vec![json!({"a": 1}), json!({"a": 2}), json!([1, 2])]);
        assert_eq!(reader.dictionary(), &["a".to_string()]);
        assert_eq!(reader.stats().value_records, 3);
    }

    #[test]
    fn test_records_stream_kinds() {
        let mut reader = DlogReader::new(Cursor::new(sample()), DecodeOpts::default());
        let kinds: Vec<&str> = reader
            .records(true)
            .map(|entry| entry.map(|e| e.record.kind().name()))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(kinds, vec!["header", "clear", "add", "value", "value", "value"]);
    }

    #[test]
    fn test_skipped_values_have_no_value() {
        let mut reader = DlogReader::new(Cursor::new(sample()), DecodeOpts::default());
        for entry in reader.records(true) {
            if let Record::Value { value, .. } = entry.unwrap().record {
                assert!(value.is_none());
            }
        }
    }

    #[test]
    fn test_stream_ends_after_error() {
        let mut bytes = sample();
        bytes.truncate(bytes.len() - 1);
        let mut reader = DlogReader::new(Cursor::new(bytes), DecodeOpts::default());
        let results: Vec<Result<Value>> = reader.values().collect();
        assert_eq!(results.len(), 3);
        assert!(matches!(results[2], Err(DlogError::TruncatedStream)));
    }
}
