//! Storage Module
//!
//! Durable ordered key-value storage underneath the queue engine.
//!
//! ## Responsibilities
//! - Point get/put/delete by byte-string key
//! - Atomic multi-key batches
//! - Durability through the WAL (`LogStore`)
//! - A volatile twin for tests and embedding (`MemoryStore`)
//!
//! ## On-disk Layout (`LogStore`)
//! ```text
//! {data_dir}/
//!   ├── wal.log            (live log, replayed on open)
//!   └── wal.log.compact    (only present while a compaction runs)
//! ```

mod batch;
mod log_store;
mod memory;

pub use batch::{WriteBatch, WriteOptions};
pub use log_store::LogStore;
pub use memory::MemoryStore;

use crate::error::Result;

/// A sorted, durable byte-string store
///
/// Implementations must apply a [`WriteBatch`] all-or-nothing.
pub trait KvStore: Send + Sync {
    /// Get a value by key; `Ok(None)` when absent
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Apply a batch of mutations atomically
    fn write(&self, batch: WriteBatch, options: &WriteOptions) -> Result<()>;

    /// Put a key-value pair
    fn put(&self, key: &[u8], value: &[u8], options: &WriteOptions) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.put(key, value);
        self.write(batch, options)
    }

    /// Make every completed write durable
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Delete a key (absent keys are not an error)
    fn delete(&self, key: &[u8], options: &WriteOptions) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.delete(key);
        self.write(batch, options)
    }
}
