//! WAL Recovery
//!
//! Handles crash recovery by replaying the WAL.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::Result;
use crate::types::Operation;

use super::{BlockRead, WalReader};

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of records successfully recovered
    pub entries_recovered: u64,

    /// Number of corrupted blocks skipped
    pub entries_corrupted: u64,

    /// Whether a torn tail was found (and, for `recover`, removed)
    pub was_truncated: bool,
}

impl WalRecovery {
    /// Recover operations from a WAL file
    ///
    /// This will:
    /// 1. Read every block in order
    /// 2. Skip (and count) blocks that fail to decode
    /// 3. Truncate a partial block at the end
    /// 4. Return all valid operations in append order
    ///
    /// A missing file recovers to nothing.
    pub fn recover(path: &Path, block_size: usize) -> Result<(Vec<Operation>, RecoveryResult)> {
        let (ops, result, torn_at) = Self::scan(path, block_size)?;

        if let Some(offset) = torn_at {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(offset)?;
            file.sync_all()?;
            tracing::warn!(
                path = %path.display(),
                offset,
                "truncated partial WAL block"
            );
        }

        Ok((ops, result))
    }

    /// Verify integrity of a WAL file without modifying it
    pub fn verify(path: &Path, block_size: usize) -> Result<RecoveryResult> {
        let (_, result, _) = Self::scan(path, block_size)?;
        Ok(result)
    }

    fn scan(
        path: &Path,
        block_size: usize,
    ) -> Result<(Vec<Operation>, RecoveryResult, Option<u64>)> {
        let mut ops = Vec::new();
        let mut result = RecoveryResult::default();
        let mut torn_at = None;

        if !path.exists() {
            return Ok((ops, result, torn_at));
        }

        for block in WalReader::open(path, block_size)? {
            match block? {
                BlockRead::Record(op) => {
                    ops.push(op);
                    result.entries_recovered += 1;
                }
                BlockRead::Corrupt { offset, reason } => {
                    tracing::warn!(offset, %reason, "skipping corrupt WAL block");
                    result.entries_corrupted += 1;
                }
                BlockRead::TornTail { offset, len } => {
                    tracing::debug!(offset, len, "partial WAL block at end of file");
                    result.was_truncated = true;
                    torn_at = Some(offset);
                }
            }
        }

        Ok((ops, result, torn_at))
    }
}
