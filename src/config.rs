//! Configuration for AtlasQ
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for an AtlasQ instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     └── wal.log          (write-ahead log, the only data file)
    pub data_dir: PathBuf,

    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    /// WAL size (in bytes) that triggers a compaction rewrite
    pub compaction_threshold: u64,

    /// fsync every engine write, on top of the WAL sync strategy
    pub sync_writes: bool,

    // -------------------------------------------------------------------------
    // Queue Configuration
    // -------------------------------------------------------------------------
    /// How unparsable position records are handled
    pub recovery_policy: RecoveryPolicy,

    /// What dequeue does with the record it just delivered
    pub delivered_record_policy: DeliveredRecordPolicy,

    /// Whether multi-key updates go out as one batch
    pub commit_mode: CommitMode,

    /// Scope of the serializing guard
    pub lock_granularity: LockGranularity,

    /// Longest channel name accepted at the request boundary (bytes)
    pub max_channel_name_len: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max connections waiting for a worker
    pub max_connections: usize,

    /// Number of connection worker threads
    pub worker_threads: usize,

    /// Connection read timeout (milliseconds)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds)
    pub write_timeout_ms: u64,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

/// Handling of position records that exist but do not parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryPolicy {
    /// Treat the cursor as 0 and log a warning
    #[default]
    Lenient,

    /// Fail the operation with `CorruptPosition`
    Strict,
}

/// Fate of a message record once it has been dequeued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveredRecordPolicy {
    /// Delete the `<channel>:<sequence>` record that was delivered
    #[default]
    Reclaim,

    /// Delete the bare `<channel>` key instead, leaving delivered records
    /// in place (the historical on-disk behavior)
    RetainLegacy,
}

/// How the engine groups its writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitMode {
    /// One store write per step
    #[default]
    Sequential,

    /// Record write and cursor update in a single atomic batch
    Atomic,
}

/// Scope of the engine's serializing guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockGranularity {
    /// One mutex per channel
    #[default]
    PerChannel,

    /// One mutex for the whole engine
    Global,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./atlasq_data"),
            wal_sync_strategy: WalSyncStrategy::EveryNEntries { count: 100 },
            compaction_threshold: 64 * 1024 * 1024, // 64 MB
            sync_writes: false,
            recovery_policy: RecoveryPolicy::Lenient,
            delivered_record_policy: DeliveredRecordPolicy::Reclaim,
            commit_mode: CommitMode::Sequential,
            lock_granularity: LockGranularity::PerChannel,
            max_channel_name_len: 80,
            listen_addr: "127.0.0.1:8080".to_string(),
            max_connections: 1024,
            worker_threads: 8,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the WAL compaction threshold (in bytes)
    pub fn compaction_threshold(mut self, bytes: u64) -> Self {
        self.config.compaction_threshold = bytes;
        self
    }

    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.config.sync_writes = sync;
        self
    }

    pub fn recovery_policy(mut self, policy: RecoveryPolicy) -> Self {
        self.config.recovery_policy = policy;
        self
    }

    pub fn delivered_record_policy(mut self, policy: DeliveredRecordPolicy) -> Self {
        self.config.delivered_record_policy = policy;
        self
    }

    pub fn commit_mode(mut self, mode: CommitMode) -> Self {
        self.config.commit_mode = mode;
        self
    }

    pub fn lock_granularity(mut self, granularity: LockGranularity) -> Self {
        self.config.lock_granularity = granularity;
        self
    }

    /// Set the channel name length limit (in bytes)
    pub fn max_channel_name_len(mut self, len: usize) -> Self {
        self.config.max_channel_name_len = len;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of queued connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the number of worker threads
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
