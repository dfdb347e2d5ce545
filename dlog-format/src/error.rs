//! Error types for the dlog format

use thiserror::Error;

/// dlog error types
///
/// Every variant is fatal to the stream that produced it; there is no
/// partial-record recovery.
#[derive(Debug, Error)]
pub enum DlogError {
    /// A record terminator `E` was not followed by a newline.
    #[error("Framing error at offset {offset}: expected newline after record terminator, found 0x{found:02x}")]
    Framing {
        /// Offset of the byte that should have been `\n`.
        offset: u64,
        /// The byte actually found.
        found: u8,
    },
    /// A tag byte is not part of the token grammar.
    #[error("Unknown token 0x{tag:02x} at offset {offset}")]
    UnknownToken {
        /// Offending byte.
        tag: u8,
        /// Offset of the offending byte.
        offset: u64,
    },
    /// Backlink bookkeeping disagrees with the decoder's view of the stream.
    #[error("Dictionary desync at offset {offset}: last dictionary record at {last_dict} + backlink {backlink} does not land on this record")]
    Desync {
        /// Start offset of the `A`/`V` record.
        offset: u64,
        /// Decoder's last dictionary-affecting record offset.
        last_dict: u64,
        /// Backlink stored in the record.
        backlink: u64,
    },
    /// Header version differs from [`crate::constants::FORMAT_VERSION`].
    #[error("Format version mismatch: stream has {found}, expected {expected}")]
    VersionMismatch {
        /// Version this decoder understands.
        expected: u64,
        /// Version written in the stream header.
        found: u64,
    },
    /// A dictionary reference points past the end of the dictionary.
    #[error("Dictionary index {index} out of range (dictionary holds {len} entries)")]
    DictionaryIndexOutOfRange {
        /// Referenced index.
        index: u64,
        /// Current dictionary length.
        len: usize,
    },
    /// A string literal is not valid UTF-8.
    #[error("Invalid UTF-8 in string literal: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    /// Input ended in the middle of a token or record.
    #[error("Truncated stream: input ended inside a token")]
    TruncatedStream,
    /// A varint or negated integer does not fit in 64 bits.
    #[error("Integer overflow")]
    IntegerOverflow,
    /// The encoder was handed a value the wire format cannot carry.
    #[error("Unsupported value type: {0}")]
    UnsupportedValueType(String),
    /// A token that cannot start a record appeared at record position.
    #[error("Invalid record start 0x{tag:02x} at offset {offset}")]
    InvalidRecordStart {
        /// Tag byte found at record position.
        tag: u8,
        /// Offset of the tag byte.
        offset: u64,
    },
    /// A well-formed token appeared where the grammar does not allow it.
    #[error("Unexpected token 0x{found:02x} at offset {offset}: expected {expected}")]
    UnexpectedToken {
        /// What the grammar required at this point.
        expected: &'static str,
        /// Tag byte actually found.
        found: u8,
        /// Offset of the token.
        offset: u64,
    },
    /// A non-empty stream did not begin with an `H` record.
    #[error("Missing stream header")]
    MissingHeader,
    /// A `V` record's payload did not span its declared length.
    #[error("Payload length mismatch at offset {offset}: declared {declared} bytes, parsed {actual}")]
    PayloadLengthMismatch {
        /// Start offset of the `V` record.
        offset: u64,
        /// Length stored in the record.
        declared: u64,
        /// Bytes the payload actually spanned.
        actual: u64,
    },
    /// A configured security limit was exceeded.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),
    /// An encoder input line is not valid JSON.
    #[error("Invalid JSON on input line {line}: {source}")]
    InvalidInputLine {
        /// 1-based input line number.
        line: usize,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
    /// I/O operation failed while reading or writing data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parsing or serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, DlogError>;
