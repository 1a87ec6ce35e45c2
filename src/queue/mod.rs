//! Queue Module
//!
//! Building blocks of the queue engine.
//!
//! ## Components
//! - `keys`: the on-disk key namespace
//! - `registry`: ordered set of channel names
//! - `position`: per-channel head/tail cursors
//! - `locks`: serializing guards
//!
//! ## Channel State
//! ```text
//!   delivered        pending            free
//! ┌───────────┬─────────────────────┬──────────
//! │ 1 .. head │ head+1 ..= tail     │ tail+1 ..
//! └───────────┴─────────────────────┴──────────
//!                depth = tail - head
//! ```

pub mod keys;
mod locks;
mod position;
mod registry;

pub use keys::validate_channel_name;
pub use locks::ChannelLocks;
pub use position::{encode as encode_position, PositionStore};
pub use registry::{ChannelRegistry, ChannelSet};

use serde::{Deserialize, Serialize};

/// Snapshot of one channel's cursors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStatus {
    pub name: String,
    pub head: u64,
    pub tail: u64,
    pub depth: u64,
}
