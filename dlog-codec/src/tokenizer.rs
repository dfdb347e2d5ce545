//! Tokenizer
//!
//! Scans the raw stream into [`Token`]s and performs the backlink check:
//! every `A`/`V` record must satisfy `last_dict + backlink == record offset`,
//! where `last_dict` is the start of the most recent `C` or `A` record.

use std::io::Read;

use dlog_format::{DlogError, Limits, Result, Tag};

use crate::source::ByteSource;
use crate::token::{Spanned, Token};

/// Streaming tokenizer over a byte source
pub struct Tokenizer<R: Read> {
    source: ByteSource<R>,
    last_dict: u64,
    limits: Limits,
    failed: bool,
}

impl<R: Read> Tokenizer<R> {
    /// Create a tokenizer at stream offset 0
    pub fn new(reader: R, limits: Limits) -> Self {
        Self {
            source: ByteSource::new(reader),
            last_dict: 0,
            limits,
            failed: false,
        }
    }

    /// Offset of the next unread byte
    pub fn offset(&self) -> u64 {
        self.source.offset()
    }

    /// Offset of the last `C` or `A` record seen
    pub fn last_dict(&self) -> u64 {
        self.last_dict
    }

    /// Read the next token. `Ok(None)` at a clean end of input.
    pub fn next_token(&mut self) -> Result<Option<Spanned>> {
        let result = self.scan();
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    /// Skip a `V` payload by its declared length, leaving the terminator unread
    pub fn skip_payload(&mut self, payload_len: u64) -> Result<()> {
        self.source.skip(payload_len)
    }

    /// Consume the tokenizer, returning the underlying reader
    pub fn into_inner(self) -> R {
        self.source.into_inner()
    }

    fn scan(&mut self) -> Result<Option<Spanned>> {
        let offset = self.source.offset();
        let Some(byte) = self.source.next_byte()? else {
            return Ok(None);
        };
        let tag = Tag::from_u8(byte).ok_or(DlogError::UnknownToken { tag: byte, offset })?;

        let token = match tag {
            Tag::Header => Token::Header,
            Tag::Clear => {
                self.last_dict = offset;
                Token::Clear
            }
            Tag::Add => {
                let backlink = self.read_backlink(offset)?;
                self.last_dict = offset;
                Token::Add { backlink }
            }
            Tag::Value => {
                let backlink = self.read_backlink(offset)?;
                let payload_len = self.source.read_varint()?;
                if payload_len > self.limits.max_payload_len as u64 {
                    return Err(DlogError::LimitExceeded(format!(
                        "payload of {} bytes at offset {} exceeds {}",
                        payload_len, offset, self.limits.max_payload_len
                    )));
                }
                Token::Value {
                    backlink,
                    payload_len,
                }
            }
            Tag::End => {
                let newline_offset = self.source.offset();
                let found = self.source.require_byte()?;
                if found != b'\n' {
                    return Err(DlogError::Framing {
                        offset: newline_offset,
                        found,
                    });
                }
                Token::End
            }
            Tag::Null => Token::Null,
            Tag::True => Token::True,
            Tag::False => Token::False,
            Tag::PosInt => Token::PosInt(self.source.read_varint()?),
            Tag::NegInt => Token::NegInt(self.source.read_varint()?),
            Tag::DictRef => Token::DictRef(self.source.read_varint()?),
            Tag::Double => Token::Double(f64::from_le_bytes(self.source.read_array::<8>()?)),
            Tag::String => Token::Str(self.read_string(offset)?),
            Tag::ArrayStart => Token::ArrayStart,
            Tag::ArrayEnd => Token::ArrayEnd,
            Tag::ObjectStart => Token::ObjectStart,
            Tag::ObjectEnd => Token::ObjectEnd,
        };

        Ok(Some(Spanned { offset, token }))
    }

    fn read_backlink(&mut self, offset: u64) -> Result<u64> {
        let backlink = self.source.read_varint()?;
        if self.last_dict.checked_add(backlink) != Some(offset) {
            return Err(DlogError::Desync {
                offset,
                last_dict: self.last_dict,
                backlink,
            });
        }
        Ok(backlink)
    }

    fn read_string(&mut self, offset: u64) -> Result<String> {
        let len = self.source.read_varint()?;
        if len > self.limits.max_string_len as u64 {
            return Err(DlogError::LimitExceeded(format!(
                "string of {} bytes at offset {} exceeds {}",
                len, offset, self.limits.max_string_len
            )));
        }
        let bytes = self.source.read_bytes(len as usize)?;
        Ok(String::from_utf8(bytes)?)
    }
}

impl<R: Read> Iterator for Tokenizer<R> {
    type Item = Result<Spanned>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.next_token().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tokens(bytes: &[u8]) -> Result<Vec<Token>> {
        Tokenizer::new(Cursor::new(bytes.to_vec()), Limits::default())
            .map(|spanned| spanned.map(|s| s.token))
            .collect()
    }

    #[test]
    fn test_header_and_clear() {
        let toks = tokens(b"HI\x01E\nCE\n").unwrap();
        assert_eq!(
            toks,
            vec![
                Token::Header,
                Token::PosInt(1),
                Token::End,
                Token::Clear,
                Token::End
            ]
        );
    }

    #[test]
    fn test_scalar_payload_tokens() {
        let mut bytes = b"NTFI\x05J\x05X\x02S\x02hi[]{}D".to_vec();
        bytes.extend_from_slice(&(-2.5f64).to_le_bytes());
        let toks = tokens(&bytes).unwrap();
        assert_eq!(
            toks,
            vec![
                Token::Null,
                Token::True,
                Token::False,
                Token::PosInt(5),
                Token::NegInt(5),
                Token::DictRef(2),
                Token::Str("hi".to_string()),
                Token::ArrayStart,
                Token::ArrayEnd,
                Token::ObjectStart,
                Token::ObjectEnd,
                Token::Double(-2.5),
            ]
        );
    }

    #[test]
    fn test_backlinks_verified_against_last_dict() {
        // C at 0, A at 3 (backlink 3), V at 10 (backlink 7)
        let bytes = b"CE\nA\x03S\x01kE\nV\x07\x01NE\n";
        let toks = tokens(bytes).unwrap();
        assert_eq!(toks[2], Token::Add { backlink: 3 });
        assert!(toks.contains(&Token::Value {
            backlink: 7,
            payload_len: 1
        }));
    }

    #[test]
    fn test_bad_backlink_is_desync() {
        let bytes = b"CE\nV\x02\x01NE\n";
        match tokens(bytes) {
            Err(DlogError::Desync {
                offset,
                last_dict,
                backlink,
            }) => {
                assert_eq!(offset, 3);
                assert_eq!(last_dict, 0);
                assert_eq!(backlink, 2);
            }
            other => panic!("expected Desync, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_token() {
        match tokens(b"NZ") {
            Err(DlogError::UnknownToken { tag, offset }) => {
                assert_eq!(tag, b'Z');
                assert_eq!(offset, 1);
            }
            other => panic!("expected UnknownToken, got {:?}", other),
        }
    }

    #[test]
    fn test_terminator_requires_newline() {
        match tokens(b"CEx") {
            Err(DlogError::Framing { offset, found }) => {
                assert_eq!(offset, 2);
                assert_eq!(found, b'x');
            }
            other => panic!("expected Framing, got {:?}", other),
        }
        assert!(matches!(tokens(b"CE"), Err(DlogError::TruncatedStream)));
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(matches!(
            tokens(b"S\x02\xC3\x28"),
            Err(DlogError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn test_truncated_string_and_double() {
        assert!(matches!(tokens(b"S\x05ab"), Err(DlogError::TruncatedStream)));
        assert!(matches!(tokens(b"D\x00\x00"), Err(DlogError::TruncatedStream)));
        assert!(matches!(tokens(b"I\x80"), Err(DlogError::TruncatedStream)));
    }

    #[test]
    fn test_string_limit() {
        let limits = Limits {
            max_string_len: 4,
            ..Limits::default()
        };
        let mut tokenizer = Tokenizer::new(Cursor::new(b"S\x05hello".to_vec()), limits);
        assert!(matches!(
            tokenizer.next_token(),
            Err(DlogError::LimitExceeded(_))
        ));
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let mut tokenizer = Tokenizer::new(Cursor::new(b"ZN".to_vec()), Limits::default());
        assert!(matches!(tokenizer.next(), Some(Err(_))));
        assert!(tokenizer.next().is_none());
    }

    #[test]
    fn test_skip_payload() {
        let bytes = b"CE\nV\x03\x03{}NE\n";
        let mut tokenizer = Tokenizer::new(Cursor::new(bytes.to_vec()), Limits::default());
        tokenizer.next_token().unwrap();
        tokenizer.next_token().unwrap();
        match tokenizer.next_token().unwrap() {
            Some(Spanned {
                token: Token::Value { payload_len, .. },
                ..
            }) => tokenizer.skip_payload(payload_len).unwrap(),
            other => panic!("expected value record, got {:?}", other),
        }
        assert_eq!(tokenizer.next_token().unwrap().unwrap().token, Token::End);
        assert!(tokenizer.next_token().unwrap().is_none());
    }
}
