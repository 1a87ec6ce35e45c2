//! Log Store
//!
//! WAL-backed durable store. Every write is appended to the log before it
//! reaches the memtable; the memtable holds the full live key set.
//!
//! ## Responsibilities
//! - Replay the WAL on open (truncating torn tails)
//! - Serialize writes so WAL order equals apply order
//! - Rewrite the log from the memtable once it outgrows its threshold

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::config::{Config, WalSyncStrategy};
use crate::error::Result;
use crate::memtable::MemTable;
use crate::wal::{Operation, WalRecovery, WalWriter};

use super::{KvStore, WriteBatch, WriteOptions};

/// Operations per WAL entry when rewriting the log
const COMPACTION_CHUNK: usize = 1024;

/// Durable `KvStore` built from a WAL and a memtable
///
/// ## Concurrency
/// - Writes: serialized by the `wal` mutex (WAL append → memtable apply)
/// - Reads: memtable read lock only, concurrent with each other
pub struct LogStore {
    /// Directory holding the log
    data_dir: PathBuf,

    /// Path of the live log
    wal_path: PathBuf,

    /// Write-ahead log (exclusive access needed)
    wal: Mutex<WalWriter>,

    /// Every live key (internal RwLock)
    memtable: MemTable,

    sync_strategy: WalSyncStrategy,

    /// Minimum WAL size that triggers a rewrite
    compaction_threshold: u64,

    /// WAL size that triggers the next rewrite (only changed under `wal`)
    next_compaction: AtomicU64,

    /// Completed rewrites since open
    compactions: AtomicU64,
}

impl LogStore {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";
    const COMPACT_FILENAME: &'static str = "wal.log.compact";

    /// Open or create a store under `config.data_dir`
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Drop any half-written compaction output
    /// 3. Recover the WAL and replay it into the memtable
    /// 4. Reopen the WAL for appends
    pub fn open(config: &Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let wal_path = config.data_dir.join(Self::WAL_FILENAME);
        let compact_path = config.data_dir.join(Self::COMPACT_FILENAME);

        if compact_path.exists() {
            tracing::warn!("Removing interrupted compaction {}", compact_path.display());
            fs::remove_file(&compact_path)?;
        }

        let memtable = MemTable::new();
        let mut next_lsn = 1;

        if wal_path.exists() {
            let (entries, recovery) = WalRecovery::recover(&wal_path)?;

            if recovery.entries_recovered > 0 || recovery.entries_corrupted > 0 {
                tracing::info!(
                    "WAL recovery: {} entries recovered, {} corrupted, last_lsn={}",
                    recovery.entries_recovered,
                    recovery.entries_corrupted,
                    recovery.last_lsn
                );
            }

            for entry in &entries {
                memtable.apply(&entry.operations);
            }
            next_lsn = recovery.last_lsn + 1;
        }

        let wal = WalWriter::open(&wal_path, config.wal_sync_strategy, next_lsn)?;

        Ok(Self {
            data_dir: config.data_dir.clone(),
            wal_path,
            wal: Mutex::new(wal),
            memtable,
            sync_strategy: config.wal_sync_strategy,
            compaction_threshold: config.compaction_threshold,
            next_compaction: AtomicU64::new(config.compaction_threshold),
            compactions: AtomicU64::new(0),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(&config)
    }

    /// Rewrite the log so it holds only live keys
    pub fn compact(&self) -> Result<()> {
        let mut wal = self.wal.lock();
        self.compact_locked(&mut wal)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Current WAL size in bytes
    pub fn wal_size(&self) -> u64 {
        self.wal.lock().size()
    }

    /// Number of live keys
    pub fn entry_count(&self) -> usize {
        self.memtable.entry_count()
    }

    /// Log rewrites completed since open
    pub fn compaction_count(&self) -> u64 {
        self.compactions.load(Ordering::Relaxed)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Called with the WAL lock held
    ///
    /// The live handle is only replaced once the rewritten log sits at
    /// `wal.log`; any earlier failure leaves the old log in place.
    fn compact_locked(&self, wal: &mut WalWriter) -> Result<()> {
        let before = wal.size();
        let compact_path = self.data_dir.join(Self::COMPACT_FILENAME);
        if compact_path.exists() {
            fs::remove_file(&compact_path)?;
        }

        let snapshot = self.memtable.snapshot();
        let mut writer = WalWriter::open(
            &compact_path,
            WalSyncStrategy::EveryNEntries { count: usize::MAX },
            1,
        )?;

        let rewritten = Self::write_snapshot(&mut writer, &snapshot)
            .and_then(|_| writer.rename(&self.wal_path));
        if let Err(e) = rewritten {
            drop(writer);
            let _ = fs::remove_file(&compact_path);
            return Err(e);
        }

        writer.set_sync_strategy(self.sync_strategy);
        *wal = writer;

        let after = wal.size();
        self.next_compaction
            .store(self.compaction_threshold.max(after.saturating_mul(2)), Ordering::Relaxed);
        self.compactions.fetch_add(1, Ordering::Relaxed);

        tracing::info!(
            "Compacted WAL: {} -> {} bytes, {} live keys",
            before,
            after,
            snapshot.len()
        );
        Ok(())
    }

    fn write_snapshot(writer: &mut WalWriter, snapshot: &[(Vec<u8>, Vec<u8>)]) -> Result<()> {
        for chunk in snapshot.chunks(COMPACTION_CHUNK) {
            let operations = chunk
                .iter()
                .map(|(key, value)| Operation::Put {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect();
            writer.append(operations, false)?;
        }
        writer.sync()
    }
}

impl KvStore for LogStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.memtable.get(key))
    }

    fn flush(&self) -> Result<()> {
        self.wal.lock().sync()
    }

    /// Steps:
    /// 1. Acquire the WAL lock
    /// 2. Append the batch as one entry (durability)
    /// 3. Apply it to the memtable
    /// 4. Compact if the log outgrew its trigger size
    ///
    /// The batch is committed once step 2 succeeds, so a failed compaction
    /// is logged and left for the next write to retry.
    fn write(&self, batch: WriteBatch, options: &WriteOptions) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut wal = self.wal.lock();
        let operations = batch.into_operations();

        wal.append(operations.clone(), options.sync)?;
        self.memtable.apply(&operations);

        if wal.size() >= self.next_compaction.load(Ordering::Relaxed) {
            if let Err(e) = self.compact_locked(&mut wal) {
                tracing::warn!("WAL compaction failed, keeping current log: {}", e);
            }
        }

        Ok(())
    }
}
