//! Value encoder
//!
//! Structural recursion over a JSON value, consulting the interner for every
//! string. The output is a bare payload; framing happens in [`crate::framer`].

use dlog_format::constants::{
    TAG_ARRAY_END, TAG_ARRAY_START, TAG_DICT_REF, TAG_DOUBLE, TAG_FALSE, TAG_NEG_INT, TAG_NULL,
    TAG_OBJECT_END, TAG_OBJECT_START, TAG_POS_INT, TAG_TRUE,
};
use dlog_format::record::{write_string_literal, write_varint};
use dlog_format::{DlogError, Result};
use serde_json::{Number, Value};

use crate::intern::{InternMode, StringInterner};

/// Append the encoding of `value` to `out`.
///
/// Arrays and objects may nest at most `max_depth` levels; deeper values are
/// rejected with [`DlogError::LimitExceeded`], matching the decoder's
/// `max_nesting_depth` check.
pub fn encode_value(
    value: &Value,
    interner: &mut StringInterner,
    max_depth: usize,
    out: &mut Vec<u8>,
) -> Result<()> {
    encode_nested(value, interner, 0, max_depth, out)
}

fn encode_nested(
    value: &Value,
    interner: &mut StringInterner,
    depth: usize,
    max_depth: usize,
    out: &mut Vec<u8>,
) -> Result<()> {
    match value {
        Value::Null => out.push(TAG_NULL),
        Value::Bool(true) => out.push(TAG_TRUE),
        Value::Bool(false) => out.push(TAG_FALSE),
        Value::Number(n) => encode_number(n, out)?,
        Value::String(s) => encode_string(s, InternMode::ByFrequency, interner, out),
        Value::Array(items) => {
            check_depth(depth, max_depth)?;
            out.push(TAG_ARRAY_START);
            for item in items {
                encode_nested(item, interner, depth + 1, max_depth, out)?;
            }
            out.push(TAG_ARRAY_END);
        }
        Value::Object(map) => {
            check_depth(depth, max_depth)?;
            out.push(TAG_OBJECT_START);
            for (key, item) in map {
                encode_string(key, InternMode::Force, interner, out);
                encode_nested(item, interner, depth + 1, max_depth, out)?;
            }
            out.push(TAG_OBJECT_END);
        }
    }
    Ok(())
}

fn check_depth(depth: usize, max_depth: usize) -> Result<()> {
    if depth >= max_depth {
        return Err(DlogError::LimitExceeded(format!(
            "nesting deeper than {}",
            max_depth
        )));
    }
    Ok(())
}

/// Append a string as a dictionary reference when interned, else as a literal
pub fn encode_string(
    value: &str,
    mode: InternMode,
    interner: &mut StringInterner,
    out: &mut Vec<u8>,
) {
    match interner.intern(value, mode) {
        Some(idx) => {
            out.push(TAG_DICT_REF);
            write_varint(out, idx);
        }
        None => write_string_literal(out, value),
    }
}

fn encode_number(n: &Number, out: &mut Vec<u8>) -> Result<()> {
    if let Some(u) = n.as_u64() {
        out.push(TAG_POS_INT);
        write_varint(out, u);
    } else if let Some(i) = n.as_i64() {
        // as_u64 failed, so i is negative; unsigned_abs covers i64::MIN
        out.push(TAG_NEG_INT);
        write_varint(out, i.unsigned_abs());
    } else if let Some(f) = n.as_f64() {
        out.push(TAG_DOUBLE);
        out.extend_from_slice(&f.to_le_bytes());
    } else {
        return Err(DlogError::UnsupportedValueType(format!(
            "number {} is neither a 64-bit integer nor a binary64 float",
            n
        )));
    }
    Ok(())
}
