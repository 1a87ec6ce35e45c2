//! MemTable implementation
//!
//! BTreeMap-based memtable with RwLock for concurrency.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::wal::Operation;

/// In-memory table holding every live key of a log store
pub struct MemTable {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,

    /// Approximate size in bytes (keys + values)
    size: AtomicUsize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            size: AtomicUsize::new(0),
        }
    }

    /// Get a value by key (read lock)
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.read().get(key).cloned()
    }

    /// Apply a group of operations under one write lock
    ///
    /// Readers never observe a partially applied group.
    pub fn apply(&self, operations: &[Operation]) -> usize {
        let mut data = self.data.write();
        let mut size = self.size.load(Ordering::Relaxed);

        for op in operations {
            match op {
                Operation::Put { key, value } => {
                    match data.insert(key.clone(), value.clone()) {
                        Some(old) => size = size - old.len() + value.len(),
                        None => size += key.len() + value.len(),
                    }
                }
                Operation::Delete { key } => {
                    if let Some(old) = data.remove(key) {
                        size -= key.len() + old.len();
                    }
                }
            }
        }

        self.size.store(size, Ordering::Relaxed);
        size
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    /// Get entry count
    pub fn entry_count(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Copy of all entries in sorted key order
    pub fn snapshot(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}
