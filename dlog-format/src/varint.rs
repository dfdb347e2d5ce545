//! Variable-length integer encoding (ULEB128)
//!
//! Seven bits per byte, low-order group first, high bit set on every byte
//! except the last. Decoding stops at 64 bits: a tenth byte may only carry
//! the top bit, and an eleventh byte is never accepted.

use smallvec::SmallVec;

use crate::error::{DlogError, Result};

/// Encode a u64 as ULEB128
pub fn encode_uleb128(val: u64) -> SmallVec<[u8; 10]> {
    let mut result = SmallVec::new();
    let mut x = val;

    while x >= 0x80 {
        result.push((x & 0x7F) as u8 | 0x80);
        x >>= 7;
    }
    result.push((x & 0x7F) as u8);

    result
}

/// Decode ULEB128 from bytes, returning the value and the bytes consumed
pub fn decode_uleb128(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut decoder = Uleb128Decoder::new();

    for (i, &byte) in bytes.iter().enumerate() {
        if let Some(value) = decoder.push(byte)? {
            return Ok((value, i + 1));
        }
    }

    Err(DlogError::TruncatedStream)
}

/// Incremental ULEB128 decoder for byte-at-a-time sources.
#[derive(Debug, Default, Clone, Copy)]
pub struct Uleb128Decoder {
    value: u64,
    shift: u32,
}

impl Uleb128Decoder {
    /// Create a decoder positioned before the first byte
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte. Returns the decoded value once the final byte is seen.
    pub fn push(&mut self, byte: u8) -> Result<Option<u64>> {
        let bits = u64::from(byte & 0x7F);

        // Tenth byte: only bit 63 is left, and nothing may follow it.
        if self.shift == 63 && (bits > 1 || byte & 0x80 != 0) {
            return Err(DlogError::IntegerOverflow);
        }

        self.value |= bits << self.shift;

        if byte & 0x80 == 0 {
            return Ok(Some(self.value));
        }

        self.shift += 7;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_uleb128_roundtrip() {
        let test_cases = vec![0u64, 1, 127, 128, 300, 16383, 16384, u64::MAX];

        for val in test_cases {
            let encoded = encode_uleb128(val);
            let (decoded, bytes_consumed) = decode_uleb128(&encoded).unwrap();
            assert_eq!(val, decoded);
            assert_eq!(bytes_consumed, encoded.len());
        }
    }

    #[test]
    fn test_uleb128_known_bytes() {
        assert_eq!(encode_uleb128(0).as_slice(), &[0x00]);
        assert_eq!(encode_uleb128(5).as_slice(), &[0x05]);
        assert_eq!(encode_uleb128(127).as_slice(), &[0x7F]);
        assert_eq!(encode_uleb128(128).as_slice(), &[0x80, 0x01]);
        assert_eq!(encode_uleb128(300).as_slice(), &[0xAC, 0x02]);
        assert_eq!(encode_uleb128(u64::MAX).len(), 10);
    }

    proptest! {
        #[test]
        fn prop_uleb128_roundtrip(value in any::<u64>()) {
            let encoded = encode_uleb128(value);
            let (decoded, consumed) = decode_uleb128(&encoded).unwrap();
            prop_assert_eq!(decoded, value);
            prop_assert_eq!(consumed, encoded.len());
            prop_assert!(consumed <= 10, "encoded length should be <= 10 bytes");
        }
    }

    #[test]
    fn test_uleb128_decode_truncated() {
        let encoded = encode_uleb128(1000);
        let truncated = &encoded[..encoded.len() - 1];
        assert!(matches!(
            decode_uleb128(truncated),
            Err(DlogError::TruncatedStream)
        ));
        assert!(matches!(decode_uleb128(&[]), Err(DlogError::TruncatedStream)));
    }

    #[test]
    fn test_uleb128_decode_too_long() {
        let mut long_bytes = vec![0x80; 11]; // 11 bytes, all with continuation bit
        long_bytes.push(0x00); // final byte
        assert!(matches!(
            decode_uleb128(&long_bytes),
            Err(DlogError::IntegerOverflow)
        ));
    }

    #[test]
    fn test_uleb128_tenth_byte_overflow() {
        let mut bytes = vec![0xFF; 9];
        bytes.push(0x02);
        assert!(matches!(
            decode_uleb128(&bytes),
            Err(DlogError::IntegerOverflow)
        ));

        let mut bytes = vec![0xFF; 9];
        bytes.push(0x01);
        assert_eq!(decode_uleb128(&bytes).unwrap(), (u64::MAX, 10));
    }

    #[test]
    fn test_uleb128_stops_at_first_terminal_byte() {
        let bytes = [0xAC, 0x02, 0xFF, 0xFF];
        assert_eq!(decode_uleb128(&bytes).unwrap(), (300, 2));
    }

    #[test]
    fn test_incremental_decoder_matches_slice_decoder() {
        let encoded = encode_uleb128(987_654_321);
        let mut decoder = Uleb128Decoder::new();
        let mut result = None;
        for &byte in encoded.iter() {
            assert!(result.is_none());
            result = decoder.push(byte).unwrap();
        }
        assert_eq!(result, Some(987_654_321));
    }
}
