//! MemTable Module
//!
//! In-memory log of recent writes.
//!
//! ## Responsibilities
//! - Fast appends and reads in memory
//! - Single-writer/multi-reader access pattern
//! - Track size for flush triggers
//! - Hand an ordered snapshot to the segment store on flush
//!
//! ## Data Structure Choice
//! An append-only `Vec<Operation>` wrapped in a RwLock:
//! - Insertion order is recency order, no sorting required
//! - Reads scan backward so the newest operation for a key wins
//! - Segments are written in the same order, so flushing is a straight copy

mod table;

pub use table::MemTable;
