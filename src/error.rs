//! Typed error taxonomy and run diagnostics.
//!
//! Grounded in the teacher pack's `k4-core::error` pattern: a `thiserror`
//! enum for conditions callers need to match on, with `anyhow` doing the
//! glue work at the outer (config/IO) boundary.

use thiserror::Error;

/// Fatal conditions. Any of these abort the pipeline (§7).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("short read mid-frame: expected {expected} bytes, got {got}")]
    ShortFrame { expected: usize, got: usize },

    #[error("payload length {got} disagrees with layout for type {type_byte:#04x}: expected {expected}")]
    PayloadLength {
        type_byte: u8,
        expected: usize,
        got: usize,
    },

    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(String),

    #[error("I/O error reading message source")]
    Io(#[from] std::io::Error),
}

/// Counters for the recoverable conditions of §7. Not fatal; accumulated
/// across a run so a caller can inspect totals without scraping logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct Diagnostics {
    pub unknown_type_byte: u64,
    pub duplicate_add: u64,
    pub unknown_refno: u64,
    pub crossed_book: u64,
    pub execute_exceeds_resting: u64,
    pub invalid_enum_byte: u64,
}

impl Diagnostics {
    pub fn total(&self) -> u64 {
        self.unknown_type_byte
            + self.duplicate_add
            + self.unknown_refno
            + self.crossed_book
            + self.execute_exceeds_resting
            + self.invalid_enum_byte
    }
}
