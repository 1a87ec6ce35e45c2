//! Write batches and write options

use crate::wal::Operation;

/// Per-write durability options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// fsync before returning, regardless of the WAL sync strategy
    pub sync: bool,
}

impl WriteOptions {
    pub fn synced() -> Self {
        Self { sync: true }
    }
}

/// An ordered group of mutations applied atomically
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    operations: Vec<Operation>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) -> &mut Self {
        self.operations.push(Operation::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        });
        self
    }

    pub fn delete(&mut self, key: &[u8]) -> &mut Self {
        self.operations.push(Operation::Delete { key: key.to_vec() });
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }
}
