//! Core type definitions shared by every tier of the store.

/// Key type. Keys are arbitrary, non-empty byte strings.
pub type Key = Vec<u8>;

/// Value type. Values are arbitrary byte strings and may be empty.
pub type Value = Vec<u8>;

/// A single mutation, in the order it was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Store a value for a key
    Put { key: Key, value: Value },

    /// Mark a key as deleted, shadowing older puts
    Tombstone { key: Key },
}

impl Operation {
    /// Build a put operation
    pub fn put(key: impl Into<Key>, value: impl Into<Value>) -> Self {
        Operation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Build a tombstone operation
    pub fn tombstone(key: impl Into<Key>) -> Self {
        Operation::Tombstone { key: key.into() }
    }

    /// The key this operation refers to
    pub fn key(&self) -> &[u8] {
        match self {
            Operation::Put { key, .. } | Operation::Tombstone { key } => key,
        }
    }

    /// The value carried by a put, `None` for a tombstone
    pub fn value(&self) -> Option<&[u8]> {
        match self {
            Operation::Put { value, .. } => Some(value),
            Operation::Tombstone { .. } => None,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, Operation::Tombstone { .. })
    }

    /// Bytes this operation contributes to the memtable size.
    ///
    /// Measured as a log line: `"set " key ' ' value '\n'` for a put,
    /// `"del " key '\n'` for a tombstone.
    pub fn footprint(&self) -> usize {
        match self {
            Operation::Put { key, value } => 4 + key.len() + 1 + value.len() + 1,
            Operation::Tombstone { key } => 4 + key.len() + 1,
        }
    }
}

/// Outcome of resolving a key within one tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The key's newest operation in this tier is a put
    Value(Value),

    /// The key's newest operation in this tier is a tombstone; stop searching
    Tombstoned,

    /// This tier knows nothing about the key; consult the next one
    Absent,
}

impl Lookup {
    /// True when the key was decided by this tier (value or tombstone)
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Lookup::Absent)
    }

    /// Collapse into the value, treating tombstones and absence alike
    pub fn into_value(self) -> Option<Value> {
        match self {
            Lookup::Value(v) => Some(v),
            Lookup::Tombstoned | Lookup::Absent => None,
        }
    }
}
