#![no_main]

use dlog_codec::{decode_values, encode_values, DecodeOpts, EncodeOpts};
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let lines: Vec<Value> = text
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();

    let bytes = encode_values(&lines, EncodeOpts::default()).expect("encode parsed JSON");
    let decoded = decode_values(&bytes, DecodeOpts::default()).expect("decode own output");
    assert_eq!(decoded, lines);
});
