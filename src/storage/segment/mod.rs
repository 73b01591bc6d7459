//! Segment Module
//!
//! Immutable on-disk files holding one flushed memtable each.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ Header (16 bytes, big-endian)                                   │
//! │   Magic (4) | EntryCount (4) | MinKeyMarker (4) | MaxKeyMarker (4)│
//! ├─────────────────────────────────────────────────────────────────┤
//! │ Entries (variable, in write order)                              │
//! │   [Value][ValLen: u32][Key][KeyLen: u32][Op: u8]                │
//! │   ... repeated for each entry ...                               │
//! │   (Op 1 = put, Op 0 = tombstone with an empty value)            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//! The lengths trail their bytes so the newest entry can be decoded first
//! by walking backward from end-of-file. There is no index and no
//! assumption about key order.

mod builder;
mod reader;

use std::path::PathBuf;

use bytes::{Buf, BufMut, BytesMut};

pub use builder::SegmentBuilder;
pub use reader::SegmentReader;

use crate::types::Operation;

// =============================================================================
// Shared Constants (used by builder and reader)
// =============================================================================

/// Magic number identifying a LodeKV segment ("LODE")
pub const MAGIC: u32 = 0x4C4F_4445;

/// Header size: Magic (4) + EntryCount (4) + MinKeyMarker (4) + MaxKeyMarker (4)
pub const HEADER_SIZE: u64 = 16;

/// Bytes after the key: KeyLen (4) + Op (1)
pub(crate) const ENTRY_TRAILER_SIZE: u64 = 5;

pub const OP_TOMBSTONE: u8 = 0;
pub const OP_PUT: u8 = 1;

/// Width of a key marker
pub const MARKER_LEN: usize = 4;

/// First four bytes of a key, zero-padded.
///
/// Marker order never contradicts key order, so a key whose marker lies
/// outside a segment's `[smallest, largest]` markers cannot be in it.
pub fn key_marker(key: &[u8]) -> [u8; MARKER_LEN] {
    let mut marker = [0u8; MARKER_LEN];
    let n = key.len().min(MARKER_LEN);
    marker[..n].copy_from_slice(&key[..n]);
    marker
}

// =============================================================================
// Header
// =============================================================================

/// Fixed-size header at the start of every segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHeader {
    pub magic: u32,
    pub entry_count: u32,
    /// Marker of the lexicographically smallest key
    pub smallest: [u8; MARKER_LEN],
    /// Marker of the lexicographically largest key
    pub largest: [u8; MARKER_LEN],
}

impl SegmentHeader {
    /// Compute the header for a set of entries.
    ///
    /// Returns `None` for an empty slice; a segment always holds data.
    pub fn from_entries(entries: &[Operation]) -> Option<Self> {
        let smallest = entries.iter().map(Operation::key).min()?;
        let largest = entries.iter().map(Operation::key).max()?;
        Some(Self {
            magic: MAGIC,
            entry_count: entries.len() as u32,
            smallest: key_marker(smallest),
            largest: key_marker(largest),
        })
    }

    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE as usize);
        buf.put_u32(self.magic);
        buf.put_u32(self.entry_count);
        buf.put_slice(&self.smallest);
        buf.put_slice(&self.largest);
        buf
    }

    /// Decode a header; the caller checks the magic number
    pub fn decode(mut bytes: &[u8]) -> Option<Self> {
        if bytes.remaining() < HEADER_SIZE as usize {
            return None;
        }
        let magic = bytes.get_u32();
        let entry_count = bytes.get_u32();
        let mut smallest = [0u8; MARKER_LEN];
        bytes.copy_to_slice(&mut smallest);
        let mut largest = [0u8; MARKER_LEN];
        bytes.copy_to_slice(&mut largest);
        Some(Self {
            magic,
            entry_count,
            smallest,
            largest,
        })
    }

    /// Quick check if a key might be in this segment (marker range check)
    pub fn might_contain(&self, key: &[u8]) -> bool {
        let marker = key_marker(key);
        marker >= self.smallest && marker <= self.largest
    }
}

// =============================================================================
// Segment Metadata
// =============================================================================

/// Metadata describing a finished segment file
#[derive(Debug, Clone)]
pub struct Segment {
    /// Segment id (1-based, increasing with recency)
    pub id: u64,
    /// Path to the segment file
    pub path: PathBuf,
    /// Header as written
    pub header: SegmentHeader,
    /// File size in bytes
    pub file_size: u64,
}

impl Segment {
    pub fn entry_count(&self) -> u32 {
        self.header.entry_count
    }
}

/// Encode one entry in its on-disk layout
pub(crate) fn encode_entry(op: &Operation) -> BytesMut {
    let key = op.key();
    let value = op.value().unwrap_or_default();
    let opcode = if op.is_tombstone() { OP_TOMBSTONE } else { OP_PUT };
    let mut buf = BytesMut::with_capacity(value.len() + key.len() + 9);
    buf.put_slice(value);
    buf.put_u32(value.len() as u32);
    buf.put_slice(key);
    buf.put_u32(key.len() as u32);
    buf.put_u8(opcode);
    buf
}
