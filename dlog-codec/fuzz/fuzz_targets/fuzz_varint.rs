#![no_main]

use dlog_format::varint::{decode_uleb128, encode_uleb128, Uleb128Decoder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let sliced = decode_uleb128(data);

    let mut decoder = Uleb128Decoder::new();
    let mut streamed = None;
    for &byte in data {
        match decoder.push(byte) {
            Ok(Some(value)) => {
                streamed = Some(Ok(value));
                break;
            }
            Ok(None) => {}
            Err(e) => {
                streamed = Some(Err(e));
                break;
            }
        }
    }

    if let Ok((value, _)) = sliced {
        assert_eq!(streamed.and_then(|r| r.ok()), Some(value));
        assert_eq!(decode_uleb128(&encode_uleb128(value)).ok(), Some((value, encode_uleb128(value).len())));
    }
});
