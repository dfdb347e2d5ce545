//! dlog Format - Core primitives for dictionary-interned JSON log streams
//!
//! This crate provides the fundamental encoding/decoding utilities for the dlog
//! wire format with no I/O dependencies. It includes:
//!
//! - Format version, tag bytes and intern defaults
//! - Variable-length integer encoding (ULEB128)
//! - Error types
//! - Security limits
//! - Record framing bytes (`H`, `C`, `A`, `V`)
//! - Tag enumeration

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod constants;
pub mod error;
pub mod limits;
pub mod record;
pub mod types;
pub mod varint;

// Re-export commonly used types
pub use error::{DlogError, Result};
pub use limits::Limits;
pub use record::RecordKind;
pub use types::Tag;
