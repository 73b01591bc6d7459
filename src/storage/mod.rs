//! Storage Module
//!
//! Persistent storage layer built from immutable segment files.
//!
//! ## Responsibilities
//! - Turn a drained memtable into one new segment
//! - Point lookups across segments, newest first
//! - Contain per-segment faults (missing file, corrupt entry)
//!
//! Segments are never merged or rewritten; each flush adds one file.

mod segment;
mod store;

pub use segment::{
    key_marker, Segment, SegmentBuilder, SegmentHeader, SegmentReader, HEADER_SIZE, MAGIC,
    MARKER_LEN, OP_PUT, OP_TOMBSTONE,
};
pub use store::SegmentStore;
