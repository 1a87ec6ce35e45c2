//! MemTable Module
//!
//! In-memory ordered table behind the log store.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Single-writer/multi-reader access pattern
//! - Track approximate size in bytes
//! - Ordered iteration for WAL rewrites
//!
//! ## Data Structure Choice
//! BTreeMap wrapped in RwLock: ordered keys make compaction output
//! deterministic.

mod table;

pub use table::MemTable;
