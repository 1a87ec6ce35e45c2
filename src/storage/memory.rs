//! Volatile in-memory store

use crate::error::Result;
use crate::memtable::MemTable;

use super::{KvStore, WriteBatch, WriteOptions};

/// `KvStore` with no persistence; contents vanish on drop
#[derive(Default)]
pub struct MemoryStore {
    table: MemTable,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.table.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// All live keys in sorted order
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.table.snapshot().into_iter().map(|(k, _)| k).collect()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.table.get(key))
    }

    fn write(&self, batch: WriteBatch, _options: &WriteOptions) -> Result<()> {
        self.table.apply(batch.operations());
        Ok(())
    }
}
