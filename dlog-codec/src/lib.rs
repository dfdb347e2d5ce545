//! dlog Codec - Encoder/decoder engines
//!
//! This crate provides the core encoding and decoding engines for dlog:
//!
//! - String interning with frequency-based promotion
//! - Value encoding into the tag grammar
//! - Record framing with backlink bookkeeping
//! - Tokenizing and parsing streams back into JSON values
//!
//! Encoder and decoder state live in [`RecordFramer`] and [`StreamDecoder`];
//! any number of independent streams can be processed side by side.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod encoder;
pub mod framer;
pub mod intern;
pub mod parser;
pub mod source;
pub mod token;
pub mod tokenizer;

// Re-export commonly used types
pub use dlog_format::{DlogError, Limits, RecordKind, Result, Tag};

// Re-export our own types
pub use encoder::encode_value;
pub use framer::{EncodeOpts, FramerStats, RecordFramer};
pub use intern::{InternMode, StringInterner, UsageTracker};
pub use parser::{DecodeOpts, DecoderStats, Record, RecordEntry, StreamDecoder};
pub use token::{Spanned, Token};
pub use tokenizer::Tokenizer;

use serde_json::Value;

/// Encode `values` into a complete in-memory stream
pub fn encode_values<'a, I>(values: I, opts: EncodeOpts) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut framer = RecordFramer::new(opts);
    let mut out = Vec::new();
    framer.start_stream(&mut out);
    for value in values {
        framer.frame_value(value, &mut out)?;
    }
    Ok(out)
}

/// Decode every value in an in-memory stream
pub fn decode_values(bytes: &[u8], opts: DecodeOpts) -> Result<Vec<Value>> {
    StreamDecoder::new(bytes, opts).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_decode_values() {
        let values = vec![json!({"a": 1, "b": "x"}), json!([1.5, null, true])];
        let bytes = encode_values(&values, EncodeOpts::default()).unwrap();
        let decoded = decode_values(&bytes, DecodeOpts::default()).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_encode_nothing_still_writes_prelude() {
        let bytes = encode_values(&[], EncodeOpts::default()).unwrap();
        assert_eq!(bytes, b"HI\x01E\nCE\n");
        assert!(decode_values(&bytes, DecodeOpts::default())
            .unwrap()
            .is_empty());
    }
}
