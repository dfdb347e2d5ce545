//! Constants for the dlog wire format

/// Wire format version written in the `H` record. Decoders reject any other value.
pub const FORMAT_VERSION: u64 = 1;

/// Every record ends with `E` followed by a newline.
pub const TERMINATOR: [u8; 2] = [TAG_END, b'\n'];

/// Record: format-version header.
pub const TAG_HEADER: u8 = b'H';
/// Record: dictionary clear.
pub const TAG_CLEAR: u8 = b'C';
/// Record: dictionary additions.
pub const TAG_ADD: u8 = b'A';
/// Record: one encoded value.
pub const TAG_VALUE: u8 = b'V';
/// Record terminator (always followed by `\n`).
pub const TAG_END: u8 = b'E';

/// Value: `null`.
pub const TAG_NULL: u8 = b'N';
/// Value: `true`.
pub const TAG_TRUE: u8 = b'T';
/// Value: `false`.
pub const TAG_FALSE: u8 = b'F';
/// Value: non-negative integer, followed by a varint.
pub const TAG_POS_INT: u8 = b'I';
/// Value: negative integer, followed by the varint magnitude.
pub const TAG_NEG_INT: u8 = b'J';
/// Value: binary64 float, followed by 8 little-endian bytes.
pub const TAG_DOUBLE: u8 = b'D';
/// Value: string literal, followed by a varint byte length and UTF-8 bytes.
pub const TAG_STRING: u8 = b'S';
/// Value: dictionary reference, followed by a varint index.
pub const TAG_DICT_REF: u8 = b'X';
/// Value: array start.
pub const TAG_ARRAY_START: u8 = b'[';
/// Value: array end.
pub const TAG_ARRAY_END: u8 = b']';
/// Value: object start.
pub const TAG_OBJECT_START: u8 = b'{';
/// Value: object end.
pub const TAG_OBJECT_END: u8 = b'}';

/// Occurrences a non-key string must accumulate before it is promoted.
pub const INTERN_THRESH: usize = 10;

/// Number of not-yet-interned strings whose occurrence counts are tracked.
pub const INTERN_CACHE_SIZE: usize = 10_000;

/// Deepest array/object nesting accepted by both the encoder and the decoder.
pub const MAX_NESTING_DEPTH: usize = 512;

/// Longest valid ULEB128 encoding of a u64.
pub const MAX_VARINT_LEN: usize = 10;
