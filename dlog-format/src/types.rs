//! Tag enumeration

use crate::constants::*;

/// Every tag byte the token grammar knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    /// Format-version header record
    Header = TAG_HEADER,
    /// Dictionary clear record
    Clear = TAG_CLEAR,
    /// Dictionary additions record
    Add = TAG_ADD,
    /// Value record
    Value = TAG_VALUE,
    /// Record terminator
    End = TAG_END,
    /// `null`
    Null = TAG_NULL,
    /// `true`
    True = TAG_TRUE,
    /// `false`
    False = TAG_FALSE,
    /// Non-negative integer
    PosInt = TAG_POS_INT,
    /// Negative integer (magnitude follows)
    NegInt = TAG_NEG_INT,
    /// binary64 float
    Double = TAG_DOUBLE,
    /// String literal
    String = TAG_STRING,
    /// Dictionary reference
    DictRef = TAG_DICT_REF,
    /// Array start
    ArrayStart = TAG_ARRAY_START,
    /// Array end
    ArrayEnd = TAG_ARRAY_END,
    /// Object start
    ObjectStart = TAG_OBJECT_START,
    /// Object end
    ObjectEnd = TAG_OBJECT_END,
}

impl Tag {
    /// Convert from u8, `None` for bytes outside the grammar
    pub fn from_u8(val: u8) -> Option<Self> {
        let tag = match val {
            TAG_HEADER => Tag::Header,
            TAG_CLEAR => Tag::Clear,
            TAG_ADD => Tag::Add,
            TAG_VALUE => Tag::Value,
            TAG_END => Tag::End,
            TAG_NULL => Tag::Null,
            TAG_TRUE => Tag::True,
            TAG_FALSE => Tag::False,
            TAG_POS_INT => Tag::PosInt,
            TAG_NEG_INT => Tag::NegInt,
            TAG_DOUBLE => Tag::Double,
            TAG_STRING => Tag::String,
            TAG_DICT_REF => Tag::DictRef,
            TAG_ARRAY_START => Tag::ArrayStart,
            TAG_ARRAY_END => Tag::ArrayEnd,
            TAG_OBJECT_START => Tag::ObjectStart,
            TAG_OBJECT_END => Tag::ObjectEnd,
            _ => return None,
        };
        Some(tag)
    }

    /// The wire byte for this tag
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether this tag may begin a record
    pub fn is_record_start(self) -> bool {
        matches!(self, Tag::Header | Tag::Clear | Tag::Add | Tag::Value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_from_u8_valid() {
        let cases = vec![
            (b'H', Tag::Header),
            (b'C', Tag::Clear),
            (b'A', Tag::Add),
            (b'V', Tag::Value),
            (b'E', Tag::End),
            (b'N', Tag::Null),
            (b'T', Tag::True),
            (b'F', Tag::False),
            (b'I', Tag::PosInt),
            (b'J', Tag::NegInt),
            (b'D', Tag::Double),
            (b'S', Tag::String),
            (b'X', Tag::DictRef),
            (b'[', Tag::ArrayStart),
            (b']', Tag::ArrayEnd),
            (b'{', Tag::ObjectStart),
            (b'}', Tag::ObjectEnd),
        ];

        for (val, expected) in cases {
            assert_eq!(Tag::from_u8(val), Some(expected));
            assert_eq!(expected.as_u8(), val);
        }
    }

    #[test]
    fn test_tag_from_u8_invalid() {
        assert_eq!(Tag::from_u8(b'Z'), None);
        assert_eq!(Tag::from_u8(b'\n'), None);
        assert_eq!(Tag::from_u8(0), None);
        assert_eq!(Tag::from_u8(255), None);
    }

    #[test]
    fn test_record_start_tags() {
        assert!(Tag::Header.is_record_start());
        assert!(Tag::Value.is_record_start());
        assert!(!Tag::End.is_record_start());
        assert!(!Tag::String.is_record_start());
    }
}
