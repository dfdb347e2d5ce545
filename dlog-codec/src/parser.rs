//! Parser / reconstructor
//!
//! Consumes tokens with one token of lookahead and rebuilds records. Every
//! tag has a fixed expansion, so dispatch is a single match on the current
//! token. The decoder owns its dictionary; it is rebuilt from `C` and `A`
//! records and must end up identical to the encoder's.

use std::io::Read;

use dlog_format::constants::FORMAT_VERSION;
use dlog_format::{DlogError, Limits, RecordKind, Result};
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::token::{Spanned, Token};
use crate::tokenizer::Tokenizer;

/// Decoder configuration
#[derive(Debug, Clone, Default)]
pub struct DecodeOpts {
    /// Security limits
    pub limits: Limits,
}

/// One fully parsed record
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// `H`: the (already validated) format version
    Header {
        /// Version found in the stream
        version: u64,
    },
    /// `C`: the dictionary was emptied
    Clear,
    /// `A`: `entries` strings were appended to the dictionary
    Add {
        /// Number of strings added
        entries: usize,
    },
    /// `V`: one reconstructed value
    Value {
        /// Declared payload length
        payload_len: u64,
        /// The value, `None` when the payload was skipped
        value: Option<Value>,
    },
}

impl Record {
    /// Which record kind this is
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Header { .. } => RecordKind::Header,
            Record::Clear => RecordKind::Clear,
            Record::Add { .. } => RecordKind::Add,
            Record::Value { .. } => RecordKind::Value,
        }
    }
}

/// A record with its position in the stream
#[derive(Debug, Clone, PartialEq)]
pub struct RecordEntry {
    /// Offset of the record's tag byte
    pub offset: u64,
    /// Stored backlink (`A`/`V` only)
    pub backlink: Option<u64>,
    /// The record
    pub record: Record,
}

/// Counters maintained while decoding
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecoderStats {
    /// `V` records decoded
    pub value_records: u64,
    /// `A` records applied
    pub add_records: u64,
    /// `C` records applied
    pub clear_records: u64,
    /// Bytes consumed so far
    pub bytes_read: u64,
}

/// Decoder state for one stream
pub struct StreamDecoder<R: Read> {
    tokenizer: Tokenizer<R>,
    lookahead: Option<Spanned>,
    dictionary: Vec<String>,
    opts: DecodeOpts,
    seen_header: bool,
    failed: bool,
    stats: DecoderStats,
}

impl<R: Read> StreamDecoder<R> {
    /// Create a decoder reading from `reader`
    pub fn new(reader: R, opts: DecodeOpts) -> Self {
        Self {
            tokenizer: Tokenizer::new(reader, opts.limits.clone()),
            lookahead: None,
            dictionary: Vec::new(),
            opts,
            seen_header: false,
            failed: false,
            stats: DecoderStats::default(),
        }
    }

    /// Next reconstructed value, skipping over dictionary records.
    /// `Ok(None)` once the stream ends at a record boundary.
    pub fn next_value(&mut self) -> Result<Option<Value>> {
        while let Some(entry) = self.next_record()? {
            if let Record::Value { value, .. } = entry.record {
                return Ok(value);
            }
        }
        Ok(None)
    }

    /// Next record, fully decoded
    pub fn next_record(&mut self) -> Result<Option<RecordEntry>> {
        self.read_record(false)
    }

    /// Next record, skipping `V` payloads by their declared length.
    ///
    /// Dictionary records are still applied, so backlinks stay verified.
    pub fn next_record_skipping_values(&mut self) -> Result<Option<RecordEntry>> {
        self.read_record(true)
    }

    /// Dictionary as rebuilt so far
    pub fn dictionary(&self) -> &[String] {
        &self.dictionary
    }

    /// Counters so far
    pub fn stats(&self) -> &DecoderStats {
        &self.stats
    }

    /// Consume the decoder, returning the underlying reader
    pub fn into_inner(self) -> R {
        self.tokenizer.into_inner()
    }

    fn read_record(&mut self, skip_values: bool) -> Result<Option<RecordEntry>> {
        let Some(Spanned { offset, token }) = self.advance()? else {
            self.stats.bytes_read = self.tokenizer.offset();
            return Ok(None);
        };

        if !self.seen_header && token != Token::Header {
            return Err(DlogError::MissingHeader);
        }

        let entry = match token {
            Token::Header => {
                let version = self.read_version()?;
                self.expect_end()?;
                self.seen_header = true;
                RecordEntry {
                    offset,
                    backlink: None,
                    record: Record::Header { version },
                }
            }
            Token::Clear => {
                self.expect_end()?;
                tracing::trace!(
                    offset,
                    dropped = self.dictionary.len(),
                    "dictionary cleared"
                );
                self.dictionary.clear();
                self.stats.clear_records += 1;
                RecordEntry {
                    offset,
                    backlink: None,
                    record: Record::Clear,
                }
            }
            Token::Add { backlink } => {
                let entries = self.read_additions()?;
                tracing::trace!(
                    offset,
                    entries,
                    dictionary = self.dictionary.len(),
                    "dictionary additions applied"
                );
                self.stats.add_records += 1;
                RecordEntry {
                    offset,
                    backlink: Some(backlink),
                    record: Record::Add { entries },
                }
            }
            Token::Value {
                backlink,
                payload_len,
            } => {
                let value = if skip_values {
                    self.tokenizer.skip_payload(payload_len)?;
                    None
                } else {
                    let payload_start = self.tokenizer.offset();
                    let value = self.parse_value(0)?;
                    // The lookahead is still empty: parse_value consumed exactly
                    // the payload tokens.
                    let actual = self.tokenizer.offset() - payload_start;
                    if actual != payload_len {
                        return Err(DlogError::PayloadLengthMismatch {
                            offset,
                            declared: payload_len,
                            actual,
                        });
                    }
                    Some(value)
                };
                self.expect_end()?;
                self.stats.value_records += 1;
                RecordEntry {
                    offset,
                    backlink: Some(backlink),
                    record: Record::Value { payload_len, value },
                }
            }
            other => {
                return Err(DlogError::InvalidRecordStart {
                    tag: other.tag().as_u8(),
                    offset,
                })
            }
        };

        self.stats.bytes_read = self.tokenizer.offset();
        Ok(Some(entry))
    }

    fn read_version(&mut self) -> Result<u64> {
        match self.require()? {
            Spanned {
                token: Token::PosInt(version),
                ..
            } => {
                if version != FORMAT_VERSION {
                    return Err(DlogError::VersionMismatch {
                        expected: FORMAT_VERSION,
                        found: version,
                    });
                }
                Ok(version)
            }
            Spanned { offset, token } => Err(DlogError::UnexpectedToken {
                expected: "format version integer",
                found: token.tag().as_u8(),
                offset,
            }),
        }
    }

    fn read_additions(&mut self) -> Result<usize> {
        let mut added = 0;
        loop {
            match self.require()? {
                Spanned {
                    token: Token::End, ..
                } => return Ok(added),
                Spanned {
                    token: Token::Str(entry),
                    ..
                } => {
                    if self.dictionary.len() >= self.opts.limits.max_dictionary_entries {
                        return Err(DlogError::LimitExceeded(format!(
                            "dictionary exceeds {} entries",
                            self.opts.limits.max_dictionary_entries
                        )));
                    }
                    self.dictionary.push(entry);
                    added += 1;
                }
                Spanned { offset, token } => {
                    return Err(DlogError::UnexpectedToken {
                        expected: "string literal in dictionary record",
                        found: token.tag().as_u8(),
                        offset,
                    })
                }
            }
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value> {
        let Spanned { offset, token } = self.require()?;

        let value = match token {
            Token::Null => Value::Null,
            Token::True => Value::Bool(true),
            Token::False => Value::Bool(false),
            Token::PosInt(n) => Value::Number(Number::from(n)),
            Token::NegInt(magnitude) => Value::Number(Number::from(negate(magnitude)?)),
            Token::Double(f) => Value::Number(Number::from_f64(f).ok_or_else(|| {
                DlogError::UnsupportedValueType(format!(
                    "non-finite float {} at offset {} has no JSON form",
                    f, offset
                ))
            })?),
            Token::Str(s) => Value::String(s),
            Token::DictRef(index) => Value::String(self.lookup(index)?.to_string()),
            Token::ArrayStart => {
                self.check_depth(depth, offset)?;
                let mut items = Vec::new();
                while !self.peek_is(&Token::ArrayEnd)? {
                    items.push(self.parse_value(depth + 1)?);
                }
                self.advance()?;
                Value::Array(items)
            }
            Token::ObjectStart => {
                self.check_depth(depth, offset)?;
                let mut map = Map::new();
                while !self.peek_is(&Token::ObjectEnd)? {
                    let key = self.parse_key()?;
                    let item = self.parse_value(depth + 1)?;
                    map.insert(key, item);
                }
                self.advance()?;
                Value::Object(map)
            }
            other => {
                return Err(DlogError::UnexpectedToken {
                    expected: "value",
                    found: other.tag().as_u8(),
                    offset,
                })
            }
        };

        Ok(value)
    }

    fn parse_key(&mut self) -> Result<String> {
        match self.require()? {
            Spanned {
                token: Token::Str(key),
                ..
            } => Ok(key),
            Spanned {
                token: Token::DictRef(index),
                ..
            } => Ok(self.lookup(index)?.to_string()),
            Spanned { offset, token } => Err(DlogError::UnexpectedToken {
                expected: "object key string",
                found: token.tag().as_u8(),
                offset,
            }),
        }
    }

    fn lookup(&self, index: u64) -> Result<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.dictionary.get(i))
            .map(String::as_str)
            .ok_or(DlogError::DictionaryIndexOutOfRange {
                index,
                len: self.dictionary.len(),
            })
    }

    fn check_depth(&self, depth: usize, offset: u64) -> Result<()> {
        if depth >= self.opts.limits.max_nesting_depth {
            return Err(DlogError::LimitExceeded(format!(
                "nesting deeper than {} at offset {}",
                self.opts.limits.max_nesting_depth, offset
            )));
        }
        Ok(())
    }

    fn expect_end(&mut self) -> Result<()> {
        match self.require()? {
            Spanned {
                token: Token::End, ..
            } => Ok(()),
            Spanned { offset, token } => Err(DlogError::UnexpectedToken {
                expected: "record terminator",
                found: token.tag().as_u8(),
                offset,
            }),
        }
    }

    fn peek_is(&mut self, expected: &Token) -> Result<bool> {
        if self.lookahead.is_none() {
            self.lookahead = Some(self.require_fresh()?);
        }
        Ok(self
            .lookahead
            .as_ref()
            .is_some_and(|spanned| &spanned.token == expected))
    }

    fn advance(&mut self) -> Result<Option<Spanned>> {
        match self.lookahead.take() {
            Some(spanned) => Ok(Some(spanned)),
            None => self.tokenizer.next_token(),
        }
    }

    fn require(&mut self) -> Result<Spanned> {
        match self.lookahead.take() {
            Some(spanned) => Ok(spanned),
            None => self.require_fresh(),
        }
    }

    fn require_fresh(&mut self) -> Result<Spanned> {
        self.tokenizer
            .next_token()?
            .ok_or(DlogError::TruncatedStream)
    }
}

impl<R: Read> Iterator for StreamDecoder<R> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = self.next_value();
        self.failed = result.is_err();
        result.transpose()
    }
}

fn negate(magnitude: u64) -> Result<i64> {
    if magnitude == 1u64 << 63 {
        return Ok(i64::MIN);
    }
    i64::try_from(magnitude)
        .map(|m| -m)
        .map_err(|_| DlogError::IntegerOverflow)
}
