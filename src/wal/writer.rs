//! WAL Writer
//!
//! Handles appending entries to the WAL file.

use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::Result;

use super::{Operation, WalEntry};

/// Writes entries to the WAL file
///
/// Each frame goes to the file in a single `write_all`; a frame that fails
/// to write or sync is cut off again, so the file only ever ends on a
/// frame boundary that was acknowledged.
pub struct WalWriter {
    /// Path of the log file
    path: PathBuf,

    /// Append handle
    file: File,

    /// LSN assigned to the next appended entry
    next_lsn: u64,

    /// When to fsync
    sync_strategy: WalSyncStrategy,

    /// Entries appended since the last fsync
    unsynced: usize,

    /// Length of the acknowledged prefix in bytes
    size: u64,
}

impl WalWriter {
    /// Open or create a WAL file, appending after existing entries
    ///
    /// `next_lsn` continues the sequence recovered from the file.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy, next_lsn: u64) -> Result<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let size = file.seek(SeekFrom::End(0))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            next_lsn: next_lsn.max(1),
            sync_strategy,
            unsynced: 0,
            size,
        })
    }

    /// Append one entry holding `operations`; returns its LSN
    ///
    /// `force_sync` fsyncs regardless of the sync strategy. On error the
    /// LSN is not consumed and the file is truncated back to its previous
    /// length.
    pub fn append(&mut self, operations: Vec<Operation>, force_sync: bool) -> Result<u64> {
        let lsn = self.next_lsn;
        let frame = WalEntry::new(lsn, operations).encode()?;

        let due = force_sync
            || match self.sync_strategy {
                WalSyncStrategy::EveryWrite => true,
                WalSyncStrategy::EveryNEntries { count } => self.unsynced + 1 >= count.max(1),
            };

        if let Err(e) = self.write_frame(&frame, due) {
            self.discard_tail();
            return Err(e);
        }

        self.next_lsn += 1;
        self.size += frame.len() as u64;
        self.unsynced = if due { 0 } else { self.unsynced + 1 };

        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    pub fn set_sync_strategy(&mut self, sync_strategy: WalSyncStrategy) {
        self.sync_strategy = sync_strategy;
    }

    /// Move the file to `to`, keeping this handle
    pub fn rename(&mut self, to: &Path) -> Result<()> {
        fs::rename(&self.path, to)?;
        self.path = to.to_path_buf();
        Ok(())
    }

    /// LSN that the next append will receive
    pub fn current_lsn(&self) -> u64 {
        self.next_lsn
    }

    /// Bytes currently in the log
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_frame(&mut self, frame: &[u8], sync: bool) -> Result<()> {
        self.file.write_all(frame)?;
        if sync {
            self.file.sync_data()?;
        }
        Ok(())
    }

    /// Drop whatever part of a failed frame reached the file
    fn discard_tail(&mut self) {
        if let Err(e) = self.file.set_len(self.size) {
            tracing::error!(
                "Failed to truncate {} back to {} bytes: {}",
                self.path.display(),
                self.size,
                e
            );
        }
    }
}
