//! Segment Reader
//!
//! Point lookups by walking a segment backward from end-of-file.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use bytes::Buf;

use crate::error::{LodeError, Result};
use crate::types::{Lookup, Operation};

use super::{SegmentHeader, ENTRY_TRAILER_SIZE, HEADER_SIZE, MAGIC, OP_PUT, OP_TOMBSTONE};

/// Location of one entry, decoded from its trailing length fields
#[derive(Debug, Clone, Copy)]
struct EntryPos {
    /// Offset of the first value byte (start of the entry)
    start: u64,
    value_len: u64,
    key_start: u64,
    key_len: u64,
    opcode: u8,
}

/// Reader for one segment file
///
/// Readers are cheap and short-lived: the store opens one per lookup, so a
/// file that disappears or becomes unreadable only affects that lookup.
pub struct SegmentReader {
    id: u64,
    file: File,
    /// File length at open; segments never grow
    len: u64,
    header: SegmentHeader,
}

impl SegmentReader {
    /// Open a segment and validate its header
    pub fn open(id: u64, path: &Path) -> Result<Self> {
        let mut file = File::open(path).map_err(|source| LodeError::SegmentUnavailable { id, source })?;
        let len = file
            .metadata()
            .map_err(|source| LodeError::SegmentUnavailable { id, source })?
            .len();

        if len < HEADER_SIZE {
            return Err(corrupt(id, format!("file is {} bytes, shorter than the header", len)));
        }

        let mut raw = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut raw)
            .map_err(|source| LodeError::SegmentUnavailable { id, source })?;
        let header = SegmentHeader::decode(&raw)
            .ok_or_else(|| corrupt(id, "truncated header".to_string()))?;

        if header.magic != MAGIC {
            return Err(corrupt(
                id,
                format!("invalid magic 0x{:08x}, expected 0x{:08x}", header.magic, MAGIC),
            ));
        }

        Ok(Self {
            id,
            file,
            len,
            header,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn header(&self) -> &SegmentHeader {
        &self.header
    }

    /// File size in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True when the segment holds no entries
    pub fn is_empty(&self) -> bool {
        self.len == HEADER_SIZE
    }

    /// Find the newest entry for `key`
    ///
    /// Returns:
    /// - `Ok(Lookup::Value(v))`: newest entry is a put
    /// - `Ok(Lookup::Tombstoned)`: newest entry is a tombstone
    /// - `Ok(Lookup::Absent)`: key not in this segment
    /// - `Err(CorruptSegment)`: an entry points outside the file
    pub fn lookup(&mut self, key: &[u8]) -> Result<Lookup> {
        if !self.header.might_contain(key) {
            return Ok(Lookup::Absent);
        }

        let mut pos = self.len;
        while pos > HEADER_SIZE {
            let entry = self.entry_before(pos)?;
            if entry.key_len == key.len() as u64 {
                let candidate = self.read_at(entry.key_start, entry.key_len)?;
                if candidate == key {
                    return match entry.opcode {
                        OP_PUT => Ok(Lookup::Value(self.read_at(entry.start, entry.value_len)?)),
                        _ => Ok(Lookup::Tombstoned),
                    };
                }
            }
            pos = entry.start;
        }

        Ok(Lookup::Absent)
    }

    /// All entries in write order
    pub fn entries(&mut self) -> Result<Vec<Operation>> {
        let mut ops = Vec::new();
        let mut pos = self.len;
        while pos > HEADER_SIZE {
            let entry = self.entry_before(pos)?;
            let key = self.read_at(entry.key_start, entry.key_len)?;
            let op = match entry.opcode {
                OP_PUT => Operation::Put {
                    key,
                    value: self.read_at(entry.start, entry.value_len)?,
                },
                _ => Operation::Tombstone { key },
            };
            ops.push(op);
            pos = entry.start;
        }
        ops.reverse();
        Ok(ops)
    }

    /// Check that the header agrees with the entries actually stored
    pub fn verify(&mut self) -> Result<()> {
        let entries = self.entries()?;
        let expected = SegmentHeader::from_entries(&entries);
        match expected {
            Some(h) if h == self.header => Ok(()),
            Some(h) => Err(corrupt(
                self.id,
                format!("header {:?} does not match entries {:?}", self.header, h),
            )),
            None => Err(corrupt(self.id, "segment has no entries".to_string())),
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Decode the entry ending at `end`
    fn entry_before(&mut self, end: u64) -> Result<EntryPos> {
        // Op (1) and KeyLen (4) sit at the very end of the entry
        if end < HEADER_SIZE + ENTRY_TRAILER_SIZE + 4 {
            return Err(self.out_of_bounds(end, "entry trailer"));
        }
        let trailer = self.read_at(end - ENTRY_TRAILER_SIZE, ENTRY_TRAILER_SIZE)?;
        let mut trailer = trailer.as_slice();
        let key_len = trailer.get_u32() as u64;
        let opcode = trailer.get_u8();

        if opcode != OP_PUT && opcode != OP_TOMBSTONE {
            return Err(corrupt(
                self.id,
                format!("unknown opcode {} in entry ending at {}", opcode, end),
            ));
        }

        // ValLen (4) precedes the key
        let key_end = end - ENTRY_TRAILER_SIZE;
        let key_start = key_end
            .checked_sub(key_len)
            .filter(|&s| s >= HEADER_SIZE + 4)
            .ok_or_else(|| self.out_of_bounds(end, "key length"))?;

        let raw = self.read_at(key_start - 4, 4)?;
        let value_len = raw.as_slice().get_u32() as u64;
        let start = (key_start - 4)
            .checked_sub(value_len)
            .filter(|&s| s >= HEADER_SIZE)
            .ok_or_else(|| self.out_of_bounds(end, "value length"))?;

        Ok(EntryPos {
            start,
            value_len,
            key_start,
            key_len,
            opcode,
        })
    }

    fn read_at(&mut self, offset: u64, len: u64) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len as usize];
        self.file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| self.file.read_exact(&mut buf))
            .map_err(|source| LodeError::SegmentUnavailable { id: self.id, source })?;
        Ok(buf)
    }

    fn out_of_bounds(&self, end: u64, field: &str) -> LodeError {
        corrupt(
            self.id,
            format!("{} of entry ending at {} points outside the file", field, end),
        )
    }
}

fn corrupt(id: u64, reason: String) -> LodeError {
    LodeError::CorruptSegment { id, reason }
}
