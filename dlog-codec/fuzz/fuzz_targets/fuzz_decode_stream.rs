#![no_main]

use dlog_codec::{DecodeOpts, StreamDecoder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut decoder = StreamDecoder::new(data, DecodeOpts::default());
    while let Ok(Some(_)) = decoder.next_record() {}

    let mut skipping = StreamDecoder::new(data, DecodeOpts::default());
    while let Ok(Some(_)) = skipping.next_record_skipping_values() {}
});
