//! Position Store
//!
//! Per-channel `head` (delivered) and `tail` (enqueued) cursors, each stored
//! as decimal text in its own record.

use std::sync::Arc;

use crate::config::RecoveryPolicy;
use crate::error::{QueueError, Result};
use crate::storage::{KvStore, WriteOptions};

use super::keys::{head_key, tail_key};

pub struct PositionStore {
    store: Arc<dyn KvStore>,
    write_options: WriteOptions,
    policy: RecoveryPolicy,
}

impl PositionStore {
    pub fn new(
        store: Arc<dyn KvStore>,
        write_options: WriteOptions,
        policy: RecoveryPolicy,
    ) -> Self {
        Self {
            store,
            write_options,
            policy,
        }
    }

    pub fn head(&self, channel: &str) -> Result<u64> {
        self.read(&head_key(channel))
    }

    pub fn tail(&self, channel: &str) -> Result<u64> {
        self.read(&tail_key(channel))
    }

    pub fn set_head(&self, channel: &str, position: u64) -> Result<()> {
        self.store
            .put(&head_key(channel), &encode(position), &self.write_options)
    }

    pub fn set_tail(&self, channel: &str, position: u64) -> Result<()> {
        self.store
            .put(&tail_key(channel), &encode(position), &self.write_options)
    }

    pub fn policy(&self) -> RecoveryPolicy {
        self.policy
    }

    /// Absent → 0. Unparsable → 0 or `CorruptPosition`, per policy.
    fn read(&self, key: &[u8]) -> Result<u64> {
        let raw = match self.store.get(key)? {
            Some(raw) => raw,
            None => return Ok(0),
        };

        let parsed = std::str::from_utf8(&raw)
            .ok()
            .and_then(|text| text.parse::<u64>().ok());

        match (parsed, self.policy) {
            (Some(position), _) => Ok(position),
            (None, RecoveryPolicy::Lenient) => {
                tracing::warn!(
                    "Unparsable position {}: {:?}, recovering as 0",
                    String::from_utf8_lossy(key),
                    String::from_utf8_lossy(&raw)
                );
                Ok(0)
            }
            (None, RecoveryPolicy::Strict) => Err(QueueError::CorruptPosition {
                key: String::from_utf8_lossy(key).into_owned(),
                raw: String::from_utf8_lossy(&raw).into_owned(),
            }),
        }
    }
}

/// Decimal text encoding of a cursor
pub fn encode(position: u64) -> Vec<u8> {
    position.to_string().into_bytes()
}
