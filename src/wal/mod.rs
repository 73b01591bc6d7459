//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees through append-only logging.
//!
//! ## Responsibilities
//! - Append one fixed-size block per mutation before it becomes visible
//! - fsync every block before acknowledging the write
//! - Replay blocks in order on startup to rebuild the memtable
//! - Reset once the memtable has been flushed to a segment
//!
//! ## File Format
//! Every record occupies exactly `block_size` bytes (100 by default).
//! Integers are big-endian.
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ Put block                                                        │
//! │ ┌────────┬────────────┬─────┬─────┬────────────┬───────┬────┬──┐ │
//! │ │ "set " │ KeyLen (4) │ Key │ ' ' │ ValLen (4) │ Value │ #… │\n│ │
//! │ └────────┴────────────┴─────┴─────┴────────────┴───────┴────┴──┘ │
//! ├──────────────────────────────────────────────────────────────────┤
//! │ Tombstone block                                                  │
//! │ ┌────────┬────────────┬─────┬──────────────────────────────┬──┐  │
//! │ │ "del " │ KeyLen (4) │ Key │ #… (fill)                    │\n│  │
//! │ └────────┴────────────┴─────┴──────────────────────────────┴──┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//! Because blocks are fixed-width, a damaged block can be skipped without
//! losing alignment for the blocks after it.

mod entry;
mod reader;
mod recovery;
mod writer;

pub use entry::{
    decode_block, encode_block, record_size, DEFAULT_BLOCK_SIZE, FILL_BYTE, MIN_BLOCK_SIZE,
    PUT_OVERHEAD, PUT_TAG, SEPARATOR, TERMINATOR, TOMBSTONE_OVERHEAD, TOMBSTONE_TAG,
};
pub use reader::{BlockRead, WalReader};
pub use recovery::{RecoveryResult, WalRecovery};
pub use writer::WalWriter;
