//! Decoder tokens

use dlog_format::Tag;

/// One lexical unit of the stream, with its inline payload decoded
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `H`
    Header,
    /// `C`
    Clear,
    /// `A` with its verified backlink
    Add {
        /// Distance back to the previous `C`/`A` record
        backlink: u64,
    },
    /// `V` with its verified backlink and declared payload length
    Value {
        /// Distance back to the previous `C`/`A` record
        backlink: u64,
        /// Byte length of the encoded payload
        payload_len: u64,
    },
    /// `E` followed by a newline
    End,
    /// `N`
    Null,
    /// `T`
    True,
    /// `F`
    False,
    /// `I` and its value
    PosInt(u64),
    /// `J` and its magnitude (sign applied by the parser)
    NegInt(u64),
    /// `D` and its value
    Double(f64),
    /// `S` and its decoded text
    Str(String),
    /// `X` and its dictionary index
    DictRef(u64),
    /// `[`
    ArrayStart,
    /// `]`
    ArrayEnd,
    /// `{`
    ObjectStart,
    /// `}`
    ObjectEnd,
}

impl Token {
    /// Tag byte this token was read from
    pub fn tag(&self) -> Tag {
        match self {
            Token::Header => Tag::Header,
            Token::Clear => Tag::Clear,
            Token::Add { .. } => Tag::Add,
            Token::Value { .. } => Tag::Value,
            Token::End => Tag::End,
            Token::Null => Tag::Null,
            Token::True => Tag::True,
            Token::False => Tag::False,
            Token::PosInt(_) => Tag::PosInt,
            Token::NegInt(_) => Tag::NegInt,
            Token::Double(_) => Tag::Double,
            Token::Str(_) => Tag::String,
            Token::DictRef(_) => Tag::DictRef,
            Token::ArrayStart => Tag::ArrayStart,
            Token::ArrayEnd => Tag::ArrayEnd,
            Token::ObjectStart => Tag::ObjectStart,
            Token::ObjectEnd => Tag::ObjectEnd,
        }
    }
}

/// A token and the offset of its tag byte
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    /// Offset of the tag byte from stream start
    pub offset: u64,
    /// The token
    pub token: Token,
}
