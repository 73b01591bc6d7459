//! Segment Store
//!
//! Manages the set of segment files and coordinates reads/writes.
//!
//! ## Responsibilities
//! - Discover existing segments on startup
//! - Search segments newest → oldest for reads
//! - Create new segments from memtable flushes
//! - Isolate per-segment faults so one bad file never hides older data

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::error::Result;
use crate::types::{Lookup, Operation};

use super::segment::{Segment, SegmentBuilder, SegmentReader};

const SEGMENT_PREFIX: &str = "segment_";
const SEGMENT_EXT: &str = "sst";
const TMP_EXT: &str = "tmp";

/// Manages the segment files in one directory
///
/// ## Concurrency:
/// - `segment_ids`: Protected by RwLock (many concurrent readers, exclusive writer)
/// - `next_segment_id`: Atomic counter, advanced only after a successful
///   write while `create_lock` is held
/// - Segment files are immutable and opened per lookup, so reading them
///   needs no lock at all
pub struct SegmentStore {
    /// Directory where segments are stored
    dir: PathBuf,

    /// Published segment ids, ascending (oldest first)
    segment_ids: RwLock<Vec<u64>>,

    /// Next id for creating new segments
    next_segment_id: AtomicU64,

    /// Serializes segment creation (id reservation through publish)
    create_lock: Mutex<()>,
}

impl SegmentStore {
    /// Open or create storage in the given directory
    ///
    /// On startup:
    /// 1. Create directory if it doesn't exist
    /// 2. Remove temp files left by an interrupted flush
    /// 3. Discover existing segment files
    /// 4. Next id = highest id + 1
    pub fn open(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)?;

        let mut ids: Vec<u64> = Vec::new();
        for entry in fs::read_dir(path)? {
            let file_path = entry?.path();
            if !file_path.is_file() {
                continue;
            }

            if file_path.extension().is_some_and(|ext| ext == TMP_EXT) {
                tracing::info!(path = %file_path.display(), "removing unfinished segment");
                fs::remove_file(&file_path)?;
                continue;
            }

            if let Some(id) = Self::parse_segment_id(&file_path) {
                ids.push(id);
            }
        }
        ids.sort_unstable();

        let next_id = ids.last().map(|&id| id + 1).unwrap_or(1);

        tracing::debug!(
            dir = %path.display(),
            segments = ids.len(),
            next_id,
            "segment store opened"
        );

        Ok(Self {
            dir: path.to_path_buf(),
            segment_ids: RwLock::new(ids),
            next_segment_id: AtomicU64::new(next_id),
            create_lock: Mutex::new(()),
        })
    }

    /// Persist `entries` as a new segment and return its id
    ///
    /// The segment becomes visible to `lookup` only after it is fully
    /// written, synced and renamed into place.
    pub fn create_segment(&self, entries: &[Operation]) -> Result<u64> {
        Ok(self.create_segment_with_meta(entries)?.id)
    }

    /// Like `create_segment`, returning the full metadata
    ///
    /// The id is only consumed once the segment is on disk, so a failed
    /// write leaves no gap in the sequence.
    pub fn create_segment_with_meta(&self, entries: &[Operation]) -> Result<Segment> {
        let _create_guard = self.create_lock.lock();

        let id = self.next_segment_id.load(Ordering::SeqCst);
        let path = self.segment_path(id);

        let segment = SegmentBuilder::write_all(id, &path, entries)?;
        self.next_segment_id.store(id + 1, Ordering::SeqCst);

        {
            let mut ids = self.segment_ids.write();
            ids.push(id);
            ids.sort_unstable();
        }

        tracing::debug!(
            id,
            entries = segment.entry_count(),
            bytes = segment.file_size,
            "segment created"
        );
        Ok(segment)
    }

    /// Resolve a key across all segments, newest first
    ///
    /// Per-segment faults are logged and skipped. Only a put or tombstone
    /// found in some segment stops the search.
    pub fn lookup(&self, key: &[u8]) -> Lookup {
        let ids = self.segment_ids.read().clone();

        for &id in ids.iter().rev() {
            match self.lookup_in(id, key) {
                Ok(Lookup::Absent) => continue,
                Ok(found) => return found,
                Err(e) => {
                    tracing::warn!(segment = id, error = %e, "skipping segment during lookup");
                    continue;
                }
            }
        }

        Lookup::Absent
    }

    /// Resolve a key in a single segment
    pub fn lookup_in(&self, id: u64, key: &[u8]) -> Result<Lookup> {
        self.reader(id)?.lookup(key)
    }

    /// Open a reader on one segment (inspection, verification)
    pub fn reader(&self, id: u64) -> Result<SegmentReader> {
        SegmentReader::open(id, &self.segment_path(id))
    }

    /// Get the number of segments
    pub fn segment_count(&self) -> usize {
        self.segment_ids.read().len()
    }

    /// Published segment ids, oldest first
    pub fn segment_ids(&self) -> Vec<u64> {
        self.segment_ids.read().clone()
    }

    /// Get the next segment id (for testing/debugging)
    pub fn next_segment_id(&self) -> u64 {
        self.next_segment_id.load(Ordering::SeqCst)
    }

    /// Get the segment directory path
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for the segment with the given id
    pub fn segment_path(&self, id: u64) -> PathBuf {
        self.dir
            .join(format!("{}{:06}.{}", SEGMENT_PREFIX, id, SEGMENT_EXT))
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Parse segment id from filename
    /// "segment_000042.sst" → Some(42)
    fn parse_segment_id(path: &Path) -> Option<u64> {
        if path.extension()? != SEGMENT_EXT {
            return None;
        }
        let name = path.file_stem()?.to_string_lossy();
        let id: u64 = name.strip_prefix(SEGMENT_PREFIX)?.parse().ok()?;
        (id > 0).then_some(id)
    }
}
