//! Engine Module
//!
//! The core storage engine that coordinates all components.
//!
//! ## Responsibilities
//! - Coordinate WAL, MemTable, and segment storage
//! - Handle concurrent read/write access
//! - Flush the memtable to a new segment when it grows past the threshold
//! - Replay the WAL on startup

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{LodeError, Result};
use crate::memtable::MemTable;
use crate::storage::SegmentStore;
use crate::types::{Lookup, Operation};
use crate::wal::{WalRecovery, WalWriter};

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (set/del/flush): Serialized by `write_lock`
///   - Only ONE write operation at a time
///   - Order: write_lock → WAL → memtable → (flush) segment → WAL reset
///
/// - **Reads** (get): Never take `write_lock`
///   - MemTable uses an internal RwLock (many concurrent readers)
///   - Segments are immutable and opened per lookup
///   - A flush holds the memtable write lock until the new segment is
///     published, so a reader sees either the old memtable or the new
///     segment, never neither
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Directory for segment files
    segment_dir: PathBuf,

    /// Path of the WAL file
    wal_path: PathBuf,

    /// Write-ahead log for durability (exclusive access needed)
    wal: Mutex<WalWriter>,

    /// In-memory table for recent writes (internal RwLock)
    memtable: MemTable,

    /// Immutable segment files (internal RwLock on the id list)
    segments: SegmentStore,

    /// Serializes write operations (set/del/flush)
    write_lock: Mutex<()>,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";
    const SEGMENT_DIR: &'static str = "segments";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Validate config and create the data directory
    /// 2. Discover existing segments
    /// 3. Replay the WAL into a fresh memtable
    /// 4. Reopen the WAL for appending
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        fs::create_dir_all(&config.data_dir)?;

        let segment_dir = config.data_dir.join(Self::SEGMENT_DIR);
        let wal_path = config.data_dir.join(Self::WAL_FILENAME);

        let segments = SegmentStore::open(&segment_dir)?;

        // Segments are already durable; only the WAL needs replaying
        let (ops, recovery) = WalRecovery::recover(&wal_path, config.wal_block_size)?;
        if recovery.entries_recovered > 0 || recovery.entries_corrupted > 0 || recovery.was_truncated {
            tracing::info!(
                recovered = recovery.entries_recovered,
                corrupted = recovery.entries_corrupted,
                truncated = recovery.was_truncated,
                "WAL replayed"
            );
        }
        let memtable = MemTable::from_operations(ops);

        let wal = WalWriter::open(&wal_path, config.wal_block_size)?;

        tracing::info!(
            data_dir = %config.data_dir.display(),
            segments = segments.segment_count(),
            memtable_entries = memtable.entry_count(),
            "engine opened"
        );

        Ok(Self {
            config,
            segment_dir,
            wal_path,
            wal: Mutex::new(wal),
            memtable,
            segments,
            write_lock: Mutex::new(()),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Get a value by key
    ///
    /// Search order:
    /// 1. MemTable (most recent writes)
    /// 2. Segments (newest to oldest)
    ///
    /// A tombstone in any tier ends the search with `KeyNotFound`.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.resolve(key).into_value().ok_or(LodeError::KeyNotFound)
    }

    /// Store a value under a key
    ///
    /// Steps:
    /// 1. Acquire write lock
    /// 2. Write to WAL (durability barrier)
    /// 3. Write to MemTable
    /// 4. Flush if the memtable grew past the threshold
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        validate_key(key)?;
        let _write_guard = self.write_lock.lock();

        self.apply(Operation::put(key, value))
    }

    /// Delete a key, returning the value it held
    ///
    /// Fails with `KeyNotFound` if the key has no live value.
    ///
    /// If the tombstone pushes the memtable over the threshold and that flush
    /// fails, the error is returned even though the tombstone is already in
    /// the WAL and memtable: the key reads as deleted, and the flush is
    /// retried by the next write. `set` behaves the same way.
    pub fn del(&self, key: &[u8]) -> Result<Vec<u8>> {
        validate_key(key)?;
        let _write_guard = self.write_lock.lock();

        // Resolved under the write lock so no writer can slip in between
        let previous = self
            .resolve(key)
            .into_value()
            .ok_or(LodeError::KeyNotFound)?;

        self.apply(Operation::tombstone(key))?;
        Ok(previous)
    }

    /// Flush memtable to a new segment (public API)
    ///
    /// Forces a flush regardless of memtable size; a no-op when empty.
    pub fn flush(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock();
        self.flush_internal()
    }

    /// Close the engine gracefully
    ///
    /// Syncs the WAL. The memtable is not flushed; its contents are
    /// replayed from the WAL on the next open.
    pub fn close(self) -> Result<()> {
        let _write_guard = self.write_lock.lock();
        self.wal.lock().sync()?;
        tracing::info!(data_dir = %self.config.data_dir.display(), "engine closed");
        Ok(())
    }

    // =========================================================================
    // Write Path
    // =========================================================================

    /// Journal then apply one operation (called with write lock held)
    fn apply(&self, op: Operation) -> Result<()> {
        // The memtable is untouched if the WAL append fails
        self.wal.lock().append(&op)?;

        let new_size = self.memtable.append(op);

        if new_size > self.config.memtable_flush_threshold {
            self.flush_internal()?;
        }
        Ok(())
    }

    /// Internal flush implementation (called with write lock held)
    fn flush_internal(&self) -> Result<()> {
        if self.memtable.is_empty() {
            return Ok(());
        }

        // Step 1: Write the segment; the memtable clears only on success
        let id = self
            .memtable
            .drain_with(|ops| self.segments.create_segment(ops))?;

        // Step 2: Reset WAL (entries are now durable in the segment)
        self.wal.lock().reset()?;

        tracing::info!(segment = id, "memtable flushed");
        Ok(())
    }

    // =========================================================================
    // Read Path
    // =========================================================================

    /// Resolve a key across memtable and segments
    fn resolve(&self, key: &[u8]) -> Lookup {
        let found = self.memtable.resolve(key);
        if found.is_resolved() {
            return found;
        }
        self.segments.lookup(key)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the segment directory path
    pub fn segment_dir(&self) -> &Path {
        &self.segment_dir
    }

    /// Get the WAL file path
    pub fn wal_path(&self) -> &Path {
        &self.wal_path
    }

    /// Get the current memtable size
    pub fn memtable_size(&self) -> usize {
        self.memtable.size()
    }

    /// Get the memtable entry count
    pub fn memtable_entry_count(&self) -> usize {
        self.memtable.entry_count()
    }

    /// Get the number of segments
    pub fn segment_count(&self) -> usize {
        self.segments.segment_count()
    }

    /// Get the segment store
    pub fn segments(&self) -> &SegmentStore {
        &self.segments
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Err(e) = self.wal.get_mut().sync() {
            tracing::error!(error = %e, "failed to sync WAL on drop");
        }
    }
}

fn validate_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(LodeError::Validation("key must not be empty".to_string()));
    }
    Ok(())
}
