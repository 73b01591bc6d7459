//! # LodeKV
//!
//! An embeddable, single-node, persistent key-value store with:
//! - Write-Ahead Logging (WAL) in fixed-size blocks for durability
//! - Crash recovery by WAL replay
//! - Single-writer/multi-reader concurrency model
//! - Immutable on-disk segments produced by memtable flushes
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Engine: set / get / del                     │
//! │            (Single Writer / Multi Reader)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     WAL     │          │  MemTable   │
//!   │  (Append)   │          │  (RwLock)   │
//!   └─────────────┘          └──────┬──────┘
//!                                   │ flush
//!                                   ▼
//!                           ┌─────────────┐
//!                           │  Segments   │
//!                           │ (immutable) │
//!                           └─────────────┘
//! ```
//!
//! ## Example
//! ```no_run
//! use lodekv::{Config, Engine};
//!
//! let engine = Engine::open(Config::builder().data_dir("./data").build()).unwrap();
//! engine.set(b"user:1", b"alice").unwrap();
//! assert_eq!(engine.get(b"user:1").unwrap(), b"alice".to_vec());
//! assert_eq!(engine.del(b"user:1").unwrap(), b"alice".to_vec());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod types;

pub mod engine;
pub mod memtable;
pub mod storage;
pub mod wal;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use engine::Engine;
pub use error::{LodeError, Result};
pub use types::{Lookup, Operation};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of LodeKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
