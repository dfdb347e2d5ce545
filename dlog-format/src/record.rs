//! Record framing bytes
//!
//! ```text
//! stream   := header clear body*
//! header   := 'H' 'I' varint(version) terminator
//! clear    := 'C' terminator
//! body     := addrec? valrec
//! addrec   := 'A' varint(backlink) stringlit+ terminator
//! valrec   := 'V' varint(backlink) varint(payloadLen) payload terminator
//! terminator := 'E' 0x0A
//! stringlit  := 'S' varint(byteLen) utf8bytes
//! ```
//!
//! The writers below append to a caller-owned buffer; they know nothing about
//! stream offsets, which the framer tracks.

use crate::constants::{TAG_ADD, TAG_CLEAR, TAG_HEADER, TAG_POS_INT, TAG_STRING, TAG_VALUE, TERMINATOR};
use crate::types::Tag;
use crate::varint::encode_uleb128;

/// The four record kinds that may appear at record position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// `H`: format version
    Header,
    /// `C`: dictionary clear
    Clear,
    /// `A`: dictionary additions
    Add,
    /// `V`: one value
    Value,
}

impl RecordKind {
    /// Map a record-start tag to its kind
    pub fn from_tag(tag: Tag) -> Option<Self> {
        match tag {
            Tag::Header => Some(RecordKind::Header),
            Tag::Clear => Some(RecordKind::Clear),
            Tag::Add => Some(RecordKind::Add),
            Tag::Value => Some(RecordKind::Value),
            _ => None,
        }
    }

    /// Lower-case name used in listings and summaries
    pub fn name(self) -> &'static str {
        match self {
            RecordKind::Header => "header",
            RecordKind::Clear => "clear",
            RecordKind::Add => "add",
            RecordKind::Value => "value",
        }
    }
}

/// Append a varint, returning the number of bytes written
pub fn write_varint(out: &mut Vec<u8>, value: u64) -> usize {
    let encoded = encode_uleb128(value);
    out.extend_from_slice(&encoded);
    encoded.len()
}

/// Append `S varint(len) bytes`
pub fn write_string_literal(out: &mut Vec<u8>, value: &str) {
    out.push(TAG_STRING);
    write_varint(out, value.len() as u64);
    out.extend_from_slice(value.as_bytes());
}

/// Append the `E\n` terminator
pub fn write_terminator(out: &mut Vec<u8>) {
    out.extend_from_slice(&TERMINATOR);
}

/// Append an `H` record carrying `version`
pub fn write_header_record(out: &mut Vec<u8>, version: u64) {
    out.push(TAG_HEADER);
    out.push(TAG_POS_INT);
    write_varint(out, version);
    write_terminator(out);
}

/// Append an empty `C` record
pub fn write_clear_record(out: &mut Vec<u8>) {
    out.push(TAG_CLEAR);
    write_terminator(out);
}

/// Append an `A` record listing `entries` in interning order
pub fn write_add_record<'a, I>(out: &mut Vec<u8>, backlink: u64, entries: I)
where
    I: IntoIterator<Item = &'a str>,
{
    out.push(TAG_ADD);
    write_varint(out, backlink);
    for entry in entries {
        write_string_literal(out, entry);
    }
    write_terminator(out);
}

/// Append a `V` record wrapping an already encoded payload
pub fn write_value_record(out: &mut Vec<u8>, backlink: u64, payload: &[u8]) {
    out.push(TAG_VALUE);
    write_varint(out, backlink);
    write_varint(out, payload.len() as u64);
    out.extend_from_slice(payload);
    write_terminator(out);
}
