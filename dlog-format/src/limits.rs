//! Security limits and configuration

use crate::constants::MAX_NESTING_DEPTH;

/// Security limits applied while decoding untrusted streams
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum byte length of a single string literal (hard: 16 MiB)
    pub max_string_len: usize,
    /// Maximum declared payload length of a `V` record (hard: 64 MiB)
    pub max_payload_len: usize,
    /// Maximum array/object nesting depth inside one value (default: 512)
    pub max_nesting_depth: usize,
    /// Maximum dictionary entries within one epoch (default: 16,777,216)
    pub max_dictionary_entries: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_string_len: 16 * 1024 * 1024,
            max_payload_len: 64 * 1024 * 1024,
            max_nesting_depth: MAX_NESTING_DEPTH,
            max_dictionary_entries: 1 << 24,
        }
    }
}
