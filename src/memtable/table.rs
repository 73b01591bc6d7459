//! MemTable implementation
//!
//! Append-only operation log with a RwLock for concurrency.

use parking_lot::RwLock;

use crate::error::Result;
use crate::types::{Lookup, Operation};

/// Everything guarded by the memtable lock
#[derive(Default)]
struct Inner {
    /// Operations in the order they were applied
    ops: Vec<Operation>,
    /// Sum of `Operation::footprint` over `ops`
    size: usize,
}

/// In-memory table for recent writes
///
/// All methods take `&self`; the engine shares one instance between its
/// writer and any number of concurrent readers.
#[derive(Default)]
pub struct MemTable {
    inner: RwLock<Inner>,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a memtable from replayed operations, preserving their order
    pub fn from_operations(ops: Vec<Operation>) -> Self {
        let size = ops.iter().map(Operation::footprint).sum();
        Self {
            inner: RwLock::new(Inner { ops, size }),
        }
    }

    /// Append an operation, returning the new byte size
    pub fn append(&self, op: Operation) -> usize {
        let mut inner = self.inner.write();
        inner.size += op.footprint();
        inner.ops.push(op);
        inner.size
    }

    /// Append a put, returning the new byte size
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) -> usize {
        self.append(Operation::Put { key, value })
    }

    /// Append a tombstone, returning the new byte size
    pub fn delete(&self, key: Vec<u8>) -> usize {
        self.append(Operation::Tombstone { key })
    }

    /// Resolve a key against the newest operation that mentions it
    pub fn resolve(&self, key: &[u8]) -> Lookup {
        let inner = self.inner.read();
        for op in inner.ops.iter().rev() {
            if op.key() != key {
                continue;
            }
            return match op {
                Operation::Put { value, .. } => Lookup::Value(value.clone()),
                Operation::Tombstone { .. } => Lookup::Tombstoned,
            };
        }
        Lookup::Absent
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.inner.read().size
    }

    /// Number of operations held (every put and tombstone counts)
    pub fn entry_count(&self) -> usize {
        self.inner.read().ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().ops.is_empty()
    }

    /// Check if the size exceeds the given limit
    pub fn should_flush(&self, size_limit: usize) -> bool {
        self.size() > size_limit
    }

    /// Copy of all operations in append order
    pub fn snapshot(&self) -> Vec<Operation> {
        self.inner.read().ops.clone()
    }

    /// Drain the memtable through `persist`.
    ///
    /// `persist` sees the ordered operations while the write lock is held.
    /// The memtable is cleared only if it returns `Ok`; on error the
    /// contents are left untouched. Readers block for the duration, so they
    /// observe either the full memtable or the cleared one, never a gap.
    pub fn drain_with<T, F>(&self, persist: F) -> Result<T>
    where
        F: FnOnce(&[Operation]) -> Result<T>,
    {
        let mut inner = self.inner.write();
        let out = persist(&inner.ops)?;
        inner.ops.clear();
        inner.size = 0;
        Ok(out)
    }

    /// Clear all entries
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.ops.clear();
        inner.size = 0;
    }
}
