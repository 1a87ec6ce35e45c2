//! Serializing guards for channel mutation

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::config::LockGranularity;

/// Map size below which dead entries are left alone
const MIN_PRUNE_AT: usize = 64;

/// Hands out the mutex guarding a channel
///
/// In `PerChannel` mode each name maps to a mutex for as long as some caller
/// holds it; the map only keeps `Weak` references, so two concurrent callers
/// always agree on a channel's mutex and idle names cost nothing once pruned.
/// In `Global` mode every name maps to the same mutex.
pub struct ChannelLocks {
    granularity: LockGranularity,
    global: Arc<Mutex<()>>,
    per_channel: Mutex<LockTable>,
}

struct LockTable {
    entries: HashMap<String, Weak<Mutex<()>>>,
    prune_at: usize,
}

impl ChannelLocks {
    pub fn new(granularity: LockGranularity) -> Self {
        Self {
            granularity,
            global: Arc::new(Mutex::new(())),
            per_channel: Mutex::new(LockTable {
                entries: HashMap::new(),
                prune_at: MIN_PRUNE_AT,
            }),
        }
    }

    /// The mutex serializing operations on `channel`
    pub fn lock_for(&self, channel: &str) -> Arc<Mutex<()>> {
        match self.granularity {
            LockGranularity::Global => Arc::clone(&self.global),
            LockGranularity::PerChannel => {
                let mut table = self.per_channel.lock();
                if let Some(lock) = table.entries.get(channel).and_then(Weak::upgrade) {
                    return lock;
                }

                if table.entries.len() >= table.prune_at {
                    table.entries.retain(|_, lock| lock.strong_count() > 0);
                    table.prune_at = MIN_PRUNE_AT.max(table.entries.len() * 2);
                }

                let lock = Arc::new(Mutex::new(()));
                table
                    .entries
                    .insert(channel.to_string(), Arc::downgrade(&lock));
                lock
            }
        }
    }

    /// Names currently tracked in `PerChannel` mode, live or awaiting pruning
    pub fn tracked(&self) -> usize {
        self.per_channel.lock().entries.len()
    }

    pub fn granularity(&self) -> LockGranularity {
        self.granularity
    }
}
