//! # AtlasQ
//!
//! A persistent named-queue engine with:
//! - Independent FIFO channels created on first enqueue
//! - Gapless per-channel sequence numbers
//! - Write-Ahead Logging (WAL) for durability
//! - Crash recovery with partial write handling
//! - TCP-based client protocol
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │                  (Multiple Clients)                          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Queue Engine                              │
//! │         (enqueue / dequeue under channel guards)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Registry   │          │  Positions  │
//!   │ (channels)  │          │ (head/tail) │
//!   └──────┬──────┘          └──────┬──────┘
//!          └────────────┬───────────┘
//!                       ▼
//!               ┌──────────────┐
//!               │   KvStore    │
//!               │ (WAL + table)│
//!               └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod memtable;
pub mod storage;
pub mod queue;
pub mod network;
pub mod protocol;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{QueueError, Result};
pub use config::Config;
pub use engine::QueueEngine;
pub use queue::ChannelStatus;
pub use storage::{KvStore, LogStore, MemoryStore};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of AtlasQ
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
