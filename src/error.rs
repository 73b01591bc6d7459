//! Error types for LodeKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using LodeError
pub type Result<T> = std::result::Result<T, LodeError>;

/// Unified error type for LodeKV operations
#[derive(Debug, Error)]
pub enum LodeError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // Write Path Errors
    // -------------------------------------------------------------------------
    /// The encoded WAL record does not fit in one block
    #[error("WAL record of {size} bytes exceeds block size of {limit} bytes")]
    RecordTooLarge { size: usize, limit: usize },

    /// A WAL or segment write/fsync failed
    #[error("Durability failure during {context}: {source}")]
    Durability {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    // -------------------------------------------------------------------------
    // Read Path Errors (scoped to a single segment)
    // -------------------------------------------------------------------------
    #[error("Segment {id} unavailable: {source}")]
    SegmentUnavailable {
        id: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Segment {id} is corrupt: {reason}")]
    CorruptSegment { id: u64, reason: String },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LodeError {
    /// Wrap an I/O error raised while persisting data
    pub(crate) fn durability(context: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| LodeError::Durability { context, source }
    }

    /// Returns true for faults that only affect a single segment
    pub fn is_segment_fault(&self) -> bool {
        matches!(
            self,
            LodeError::SegmentUnavailable { .. } | LodeError::CorruptSegment { .. }
        )
    }
}
