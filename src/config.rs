//! Configuration for LodeKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{LodeError, Result};
use crate::wal::MIN_BLOCK_SIZE;

/// Main configuration for a LodeKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files (WAL, segments)
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── wal.log          (write-ahead log)
    ///     └── segments/        (immutable segment files)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Size in bytes of every physical WAL block
    pub wal_block_size: usize,

    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Memtable byte size above which it is flushed to a new segment
    pub memtable_flush_threshold: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./lodekv_data"),
            wal_block_size: 100,
            memtable_flush_threshold: 20,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the configuration can actually hold data
    pub fn validate(&self) -> Result<()> {
        if self.wal_block_size < MIN_BLOCK_SIZE {
            return Err(LodeError::Config(format!(
                "wal_block_size must be at least {} bytes, got {}",
                MIN_BLOCK_SIZE, self.wal_block_size
            )));
        }
        if self.wal_block_size > u32::MAX as usize {
            return Err(LodeError::Config(format!(
                "wal_block_size {} does not fit the 32-bit length fields",
                self.wal_block_size
            )));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(LodeError::Config("data_dir must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the WAL block size (in bytes)
    pub fn wal_block_size(mut self, size: usize) -> Self {
        self.config.wal_block_size = size;
        self
    }

    /// Set the memtable flush threshold (in bytes)
    pub fn memtable_flush_threshold(mut self, size: usize) -> Self {
        self.config.memtable_flush_threshold = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
