//! Engine Module
//!
//! The queue engine that coordinates registry, cursors and message records.
//!
//! ## Responsibilities
//! - Implicit channel creation on first enqueue
//! - Gapless sequence assignment and strict FIFO delivery
//! - Serialize every compound operation on a channel
//! - Surface storage failures verbatim (no retries)

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;

use crate::config::{CommitMode, Config, DeliveredRecordPolicy, RecoveryPolicy};
use crate::error::{QueueError, Result};
use crate::protocol::{Command, Response};
use crate::queue::keys::{self, head_key, message_key, tail_key, REGISTRY_KEY};
use crate::queue::{
    encode_position, validate_channel_name, ChannelLocks, ChannelRegistry, ChannelStatus,
    PositionStore,
};
use crate::storage::{KvStore, LogStore, MemoryStore, WriteBatch, WriteOptions};

/// The queue engine
///
/// ## Concurrency Model
///
/// - **Mutations** (enqueue/dequeue/remove/purge): hold the channel's guard
///   from the first read to the last write
///   - `PerChannel`: different channels proceed in parallel
///   - `Global`: one operation at a time across the engine
///   - Lock order: channel guard → registry guard
///
/// - **Inspection** (depth/list/status): no guard, may observe a mutation
///   halfway (stale values are acceptable for monitoring)
pub struct QueueEngine {
    /// Engine configuration
    config: Config,

    /// Backing store shared by every channel
    store: Arc<dyn KvStore>,

    registry: ChannelRegistry,

    positions: PositionStore,

    locks: ChannelLocks,

    write_options: WriteOptions,
}

impl QueueEngine {
    /// Build an engine over an already opened store
    pub fn new(store: Arc<dyn KvStore>, config: Config) -> Self {
        let write_options = WriteOptions {
            sync: config.sync_writes,
        };

        Self {
            registry: ChannelRegistry::new(Arc::clone(&store), write_options),
            positions: PositionStore::new(
                Arc::clone(&store),
                write_options,
                config.recovery_policy,
            ),
            locks: ChannelLocks::new(config.lock_granularity),
            store,
            write_options,
            config,
        }
    }

    /// Open a durable engine under `config.data_dir`
    pub fn open(config: Config) -> Result<Self> {
        let store = LogStore::open(&config)?;
        tracing::debug!(
            "Opened log store at {} ({} keys)",
            store.data_dir().display(),
            store.entry_count()
        );
        Ok(Self::new(Arc::new(store), config))
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Volatile engine with default config
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Config::default())
    }

    // =========================================================================
    // Queue Operations
    // =========================================================================

    /// Append `value` to `channel`; returns the assigned sequence number
    ///
    /// Steps:
    /// 1. Acquire the channel guard
    /// 2. Unknown channel: register it, reset cursors to (0, 0)
    /// 3. Write the message at `tail + 1`
    /// 4. On success, advance `tail`
    pub fn enqueue(&self, channel: &str, value: impl Into<Bytes>) -> Result<u64> {
        let value = value.into();
        let lock = self.locks.lock_for(channel);
        let _guard = lock.lock();

        let tail = if self.registry.exists(channel) {
            self.positions.tail(channel)?
        } else {
            self.registry.register(channel)?;
            self.positions.set_head(channel, 0)?;
            self.positions.set_tail(channel, 0)?;
            0
        };

        let sequence = tail + 1;
        match self.config.commit_mode {
            CommitMode::Sequential => {
                self.store
                    .put(&message_key(channel, sequence), &value, &self.write_options)?;
                self.positions.set_tail(channel, sequence)?;
            }
            CommitMode::Atomic => {
                let mut batch = WriteBatch::new();
                batch
                    .put(&message_key(channel, sequence), &value)
                    .put(&tail_key(channel), &encode_position(sequence));
                self.store.write(batch, &self.write_options)?;
            }
        }

        tracing::debug!("Enqueued {}:{} ({} bytes)", channel, sequence, value.len());
        Ok(sequence)
    }

    /// Take the oldest pending message of `channel`
    ///
    /// Steps:
    /// 1. Acquire the channel guard
    /// 2. Unknown channel → `ChannelNotFound`
    /// 3. `head == tail` → reset cursors to (0, 0), `QueueEmpty`
    /// 4. Read the message at `head + 1`
    /// 5. Release the delivered record and advance `head`
    pub fn dequeue(&self, channel: &str) -> Result<Bytes> {
        let lock = self.locks.lock_for(channel);
        let _guard = lock.lock();

        if !self.registry.exists(channel) {
            return Err(QueueError::ChannelNotFound(channel.to_string()));
        }

        let head = self.positions.head(channel)?;
        let tail = self.positions.tail(channel)?;

        if head >= tail {
            if head > tail {
                if self.positions.policy() == RecoveryPolicy::Strict {
                    return Err(QueueError::CorruptPosition {
                        key: String::from_utf8_lossy(&head_key(channel)).into_owned(),
                        raw: format!("head {} ahead of tail {}", head, tail),
                    });
                }
                tracing::warn!(
                    "Channel {} has head {} ahead of tail {}, resetting",
                    channel,
                    head,
                    tail
                );
            }
            self.positions.set_head(channel, 0)?;
            self.positions.set_tail(channel, 0)?;
            return Err(QueueError::QueueEmpty(channel.to_string()));
        }

        let sequence = head + 1;
        let value = self
            .store
            .get(&message_key(channel, sequence))?
            .ok_or_else(|| QueueError::MessageNotFound {
                channel: channel.to_string(),
                sequence,
            })?;

        let released = self.delivered_key(channel, sequence);
        match self.config.commit_mode {
            CommitMode::Sequential => {
                if let Some(key) = &released {
                    self.store.delete(key, &self.write_options)?;
                }
                self.positions.set_head(channel, sequence)?;
            }
            CommitMode::Atomic => {
                let mut batch = WriteBatch::new();
                if let Some(key) = &released {
                    batch.delete(key);
                }
                batch.put(&head_key(channel), &encode_position(sequence));
                self.store.write(batch, &self.write_options)?;
            }
        }

        tracing::debug!("Dequeued {}:{} ({} left)", channel, sequence, tail - sequence);
        Ok(Bytes::from(value))
    }

    /// Pending message count (`tail - head`)
    pub fn depth(&self, channel: &str) -> Result<u64> {
        let head = self.positions.head(channel)?;
        let tail = self.positions.tail(channel)?;
        Ok(tail.saturating_sub(head))
    }

    /// Registered channels in registration order
    pub fn list_channels(&self) -> Result<Vec<String>> {
        self.registry.list()
    }

    /// Cursors of every registered channel
    pub fn status(&self) -> Result<Vec<ChannelStatus>> {
        self.registry
            .list()?
            .into_iter()
            .map(|name| {
                let head = self.positions.head(&name)?;
                let tail = self.positions.tail(&name)?;
                Ok(ChannelStatus {
                    name,
                    head,
                    tail,
                    depth: tail.saturating_sub(head),
                })
            })
            .collect()
    }

    /// Drop `channel` from the registry; its cursors and records stay
    pub fn remove_channel(&self, channel: &str) -> Result<()> {
        let lock = self.locks.lock_for(channel);
        let _guard = lock.lock();

        self.registry.remove(channel)
    }

    /// Drop `channel` and delete its cursors and undelivered records
    ///
    /// Returns the number of pending messages discarded.
    pub fn purge_channel(&self, channel: &str) -> Result<u64> {
        let lock = self.locks.lock_for(channel);
        let _guard = lock.lock();

        self.registry.remove(channel)?;

        let head = self.positions.head(channel)?;
        let tail = self.positions.tail(channel)?;
        // Retained records start at 1; reclaimed ones only after head
        let first = match self.config.delivered_record_policy {
            DeliveredRecordPolicy::Reclaim => head + 1,
            DeliveredRecordPolicy::RetainLegacy => 1,
        };

        let mut batch = WriteBatch::new();
        for sequence in first..=tail {
            batch.delete(&message_key(channel, sequence));
        }
        batch.delete(&head_key(channel)).delete(&tail_key(channel));
        self.store.write(batch, &self.write_options)?;

        let discarded = tail.saturating_sub(head);
        tracing::debug!("Purged channel {} ({} pending discarded)", channel, discarded);
        Ok(discarded)
    }

    /// Make all completed writes durable
    pub fn close(&self) -> Result<()> {
        self.store.flush()
    }

    // =========================================================================
    // Request Dispatch
    // =========================================================================

    /// Execute a command
    ///
    /// Channel names are validated here, at the request boundary.
    pub fn execute(&self, command: Command) -> Result<Response> {
        if let Some(channel) = command.channel() {
            validate_channel_name(channel, self.config.max_channel_name_len)?;
        }

        match command {
            Command::Enqueue { channel, value } => {
                let sequence = self.enqueue(&channel, value)?;
                Ok(Response::ok_u64(sequence))
            }
            Command::Dequeue { channel } => {
                let value = self.dequeue(&channel)?;
                Ok(Response::ok(Some(value.to_vec())))
            }
            Command::ListChannels => Response::ok_channels(&self.list_channels()?),
            Command::Depth { channel } => Ok(Response::ok_u64(self.depth(&channel)?)),
            Command::Status => Response::ok_status(&self.status()?),
            Command::Ping => Ok(Response::ok(Some(b"PONG".to_vec()))),
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The backing store
    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    pub fn locks(&self) -> &ChannelLocks {
        &self.locks
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Key deleted once `sequence` has been delivered, if any
    fn delivered_key(&self, channel: &str, sequence: u64) -> Option<Vec<u8>> {
        match self.config.delivered_record_policy {
            DeliveredRecordPolicy::Reclaim => Some(message_key(channel, sequence)),
            DeliveredRecordPolicy::RetainLegacy => {
                let key = keys::legacy_delivered_key(channel);
                // The bare name must not alias the registry or another
                // channel's `<c>:<suffix>` keys
                let aliases = key.as_slice() == REGISTRY_KEY || key.contains(&b':');
                (!aliases).then_some(key)
            }
        }
    }
}
