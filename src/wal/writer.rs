//! WAL Writer
//!
//! Handles appending blocks to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{LodeError, Result};
use crate::types::Operation;

use super::encode_block;

/// Writes blocks to the WAL file
///
/// Every `append` is followed by `sync_data`; a successful return means the
/// block is on stable storage.
pub struct WalWriter {
    /// Path of the log, kept for diagnostics
    path: PathBuf,
    /// File opened in append mode
    file: File,
    /// Physical size of every record
    block_size: usize,
    /// Current file length (always a multiple of `block_size`)
    len: u64,
}

impl WalWriter {
    /// Open or create a WAL file
    ///
    /// The file is expected to be block-aligned; `WalRecovery::recover`
    /// trims a torn tail before the engine opens the writer.
    pub fn open(path: &Path, block_size: usize) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let len = file.metadata()?.len();

        if len % block_size as u64 != 0 {
            tracing::warn!(
                path = %path.display(),
                len,
                block_size,
                "WAL length is not block-aligned"
            );
        }

        Ok(Self {
            path: path.to_path_buf(),
            file,
            block_size,
            len,
        })
    }

    /// Append one operation and fsync it
    ///
    /// Returns the number of records now in the log. On `RecordTooLarge`
    /// nothing is written. If the write or the fsync fails, the file is cut
    /// back to its previous length, so the block is never replayed and later
    /// blocks stay aligned.
    pub fn append(&mut self, op: &Operation) -> Result<u64> {
        self.append_with(op, File::sync_data)
    }

    /// Append path with the sync step supplied by the caller
    fn append_with<S>(&mut self, op: &Operation, sync: S) -> Result<u64>
    where
        S: FnOnce(&File) -> io::Result<()>,
    {
        let block = encode_block(op, self.block_size)?;

        if let Err(e) = self.file.write_all(&block) {
            self.rollback();
            return Err(LodeError::durability("WAL append")(e));
        }
        // An unsynced block must not be replayed as if it were acknowledged
        if let Err(e) = sync(&self.file) {
            self.rollback();
            return Err(LodeError::durability("WAL sync")(e));
        }

        self.len += self.block_size as u64;
        tracing::trace!(records = self.record_count(), "WAL block appended");
        Ok(self.record_count())
    }

    /// Truncate the log after its contents reached a segment
    pub fn reset(&mut self) -> Result<()> {
        self.file
            .set_len(0)
            .map_err(LodeError::durability("WAL reset"))?;
        self.file
            .sync_all()
            .map_err(LodeError::durability("WAL reset"))?;
        self.len = 0;
        tracing::debug!(path = %self.path.display(), "WAL reset");
        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file
            .sync_all()
            .map_err(LodeError::durability("WAL sync"))
    }

    /// Number of complete records in the log
    pub fn record_count(&self) -> u64 {
        self.len / self.block_size as u64
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Best-effort removal of a partially written block
    fn rollback(&mut self) {
        if let Err(e) = self.file.set_len(self.len) {
            tracing::error!(
                path = %self.path.display(),
                error = %e,
                "failed to roll back partial WAL block"
            );
        }
    }
}
