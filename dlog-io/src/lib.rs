//! dlog I/O - Streaming file I/O and high-level APIs
//!
//! This crate provides the `std::io` layer for dlog:
//!
//! - Streaming writers and readers
//! - NDJSON encode/decode entry points with summaries
//! - Record-level inspection for listings

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod reader;
pub mod writer;

// Re-export commonly used types
pub use dlog_codec::{DecodeOpts, EncodeOpts, Record, RecordEntry};
pub use dlog_format::{DlogError, Limits, Result};
pub use reader::{DlogReader, RecordStream, ValueStream};
pub use writer::DlogWriter;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};

/// Outcome of [`encode_ndjson`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EncodeSummary {
    /// Input lines read, blank ones included
    pub lines_read: u64,
    /// Blank input lines skipped
    pub blank_lines: u64,
    /// `V` records written
    pub value_records: u64,
    /// `A` records written
    pub add_records: u64,
    /// `C` records written
    pub clear_records: u64,
    /// Strings promoted to the dictionary
    pub strings_interned: u64,
    /// NDJSON bytes consumed
    pub bytes_in: u64,
    /// Encoded bytes produced
    pub bytes_out: u64,
}

/// Outcome of [`decode_ndjson`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodeSummary {
    /// Values written as NDJSON lines
    pub values: u64,
    /// Records read, of every kind
    pub records: u64,
    /// `A` records applied
    pub add_records: u64,
    /// `C` records applied
    pub clear_records: u64,
    /// Dictionary size at the end of the stream
    pub dictionary_entries: usize,
    /// Encoded bytes consumed
    pub bytes_read: u64,
}

/// One record as shown by [`inspect`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordInfo {
    /// Offset of the record's tag byte
    pub offset: u64,
    /// `header`, `clear`, `add` or `value`
    pub kind: &'static str,
    /// Stored backlink (`add`/`value`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backlink: Option<u64>,
    /// Format version (`header`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// Strings appended (`add`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<usize>,
    /// Declared payload length (`value`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_len: Option<u64>,
    /// Reconstructed value, unless payloads were skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Dictionary size once the record is applied
    pub dictionary_entries: usize,
}

/// Totals produced by [`inspect`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InspectSummary {
    /// Format version from the header, if the stream had one
    pub version: Option<u64>,
    /// Records of every kind
    pub records: u64,
    /// `V` records
    pub value_records: u64,
    /// `A` records
    pub add_records: u64,
    /// `C` records; each one starts a dictionary epoch
    pub clear_records: u64,
    /// Largest dictionary seen in any epoch
    pub max_dictionary_entries: usize,
    /// Dictionary size at the end of the stream
    pub final_dictionary_entries: usize,
    /// Stream length in bytes
    pub bytes: u64,
}

/// Encode NDJSON `input` into a dlog stream on `output`.
///
/// Blank lines are skipped. A line that is not valid JSON stops the encode
/// with [`DlogError::InvalidInputLine`] carrying its 1-based line number; a
/// line nested deeper than `opts.max_nesting_depth` stops it with
/// [`DlogError::LimitExceeded`].
pub fn encode_ndjson<R: Read, W: Write>(
    input: R,
    output: W,
    opts: EncodeOpts,
) -> Result<EncodeSummary> {
    let max_depth = opts.max_nesting_depth;
    let mut reader = BufReader::new(input);
    let mut writer = DlogWriter::new(BufWriter::new(output), opts)?;
    let mut summary = EncodeSummary::default();

    let mut line = String::new();
    loop {
        line.clear();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            break;
        }
        summary.lines_read += 1;
        summary.bytes_in += read as u64;

        if line.trim().is_empty() {
            summary.blank_lines += 1;
            continue;
        }

        let value = parse_line(&line, summary.lines_read as usize, max_depth)?;
        writer.write_value(&value)?;
    }

    let (_, stats) = writer.finish()?;
    summary.value_records = stats.value_records;
    summary.add_records = stats.add_records;
    summary.clear_records = stats.clear_records;
    summary.strings_interned = stats.strings_interned;
    summary.bytes_out = stats.bytes_framed;

    tracing::debug!(
        lines = summary.lines_read,
        values = summary.value_records,
        bytes_in = summary.bytes_in,
        bytes_out = summary.bytes_out,
        "encode finished"
    );
    Ok(summary)
}

fn parse_line(text: &str, line: usize, max_depth: usize) -> Result<Value> {
    // serde_json's own recursion limit (128) is lifted, so the depth is
    // bounded here before the parser recurses.
    if nesting_depth(text) > max_depth {
        return Err(DlogError::LimitExceeded(format!(
            "nesting deeper than {} on input line {}",
            max_depth, line
        )));
    }

    let mut deserializer = serde_json::Deserializer::from_str(text);
    deserializer.disable_recursion_limit();
    Value::deserialize(&mut deserializer)
        .and_then(|value| deserializer.end().map(|()| value))
        .map_err(|source| DlogError::InvalidInputLine { line, source })
}

/// Deepest `[`/`{` nesting in a JSON text, ignoring brackets inside strings
fn nesting_depth(text: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for byte in text.bytes() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

/// Decode a dlog stream on `input` into NDJSON on `output`.
///
/// Lines decoded before an error are flushed to `output` before the error
/// is returned.
pub fn decode_ndjson<R: Read, W: Write>(
    input: R,
    output: W,
    opts: DecodeOpts,
) -> Result<DecodeSummary> {
    let mut reader = DlogReader::new(input, opts);
    let mut writer = BufWriter::new(output);
    let mut summary = DecodeSummary::default();

    let outcome = write_values(&mut reader, &mut writer, &mut summary);
    writer.flush()?;

    let stats = reader.stats();
    summary.add_records = stats.add_records;
    summary.clear_records = stats.clear_records;
    summary.bytes_read = stats.bytes_read;
    summary.dictionary_entries = reader.dictionary().len();

    if let Err(e) = outcome {
        tracing::warn!(
            values = summary.values,
            bytes_read = summary.bytes_read,
            error = %e,
            "decode stopped early"
        );
        return Err(e);
    }

    tracing::debug!(
        values = summary.values,
        records = summary.records,
        bytes_read = summary.bytes_read,
        "decode finished"
    );
    Ok(summary)
}

fn write_values<R: Read, W: Write>(
    reader: &mut DlogReader<R>,
    writer: &mut W,
    summary: &mut DecodeSummary,
) -> Result<()> {
    while let Some(entry) = reader.next_record(false)? {
        summary.records += 1;
        if let Record::Value {
            value: Some(value), ..
        } = entry.record
        {
            serde_json::to_writer(&mut *writer, &value)?;
            writer.write_all(b"\n")?;
            summary.values += 1;
        }
    }
    Ok(())
}

/// Walk every record of a stream, handing each to `visit`.
///
/// With `skip_values`, `V` payloads are skipped by their declared length and
/// no values are reconstructed; backlinks and dictionary records are still
/// checked.
pub fn inspect<R, F>(
    input: R,
    opts: DecodeOpts,
    skip_values: bool,
    mut visit: F,
) -> Result<InspectSummary>
where
    R: Read,
    F: FnMut(&RecordInfo) -> Result<()>,
{
    let mut reader = DlogReader::new(input, opts);
    let mut summary = InspectSummary::default();

    while let Some(entry) = reader.next_record(skip_values)? {
        let dictionary_entries = reader.dictionary().len();
        summary.records += 1;
        summary.max_dictionary_entries = summary.max_dictionary_entries.max(dictionary_entries);

        let mut info = RecordInfo {
            offset: entry.offset,
            kind: entry.record.kind().name(),
            backlink: entry.backlink,
            version: None,
            entries: None,
            payload_len: None,
            value: None,
            dictionary_entries,
        };
        match entry.record {
            Record::Header { version } => {
                summary.version = Some(version);
                info.version = Some(version);
            }
            Record::Clear => summary.clear_records += 1,
            Record::Add { entries } => {
                summary.add_records += 1;
                info.entries = Some(entries);
            }
            Record::Value { payload_len, value } => {
                summary.value_records += 1;
                info.payload_len = Some(payload_len);
                info.value = value;
            }
        }
        visit(&info)?;
    }

    summary.final_dictionary_entries = reader.dictionary().len();
    summary.bytes = reader.stats().bytes_read;
    Ok(summary)
}
