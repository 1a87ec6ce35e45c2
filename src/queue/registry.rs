//! Channel Registry
//!
//! The ordered set of known channel names, persisted as one record under
//! [`REGISTRY_KEY`].

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{QueueError, Result};
use crate::storage::{KvStore, WriteOptions};

use super::keys::REGISTRY_KEY;

/// Insertion-ordered set of channel names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSet {
    names: Vec<String>,
}

impl ChannelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Append `name` unless present; returns whether it was added
    pub fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    /// Remove `name`; returns whether it was present
    pub fn remove(&mut self, name: &str) -> bool {
        match self.names.iter().position(|n| n == name) {
            Some(index) => {
                self.names.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.names
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&self.names)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let names: Vec<String> = bincode::deserialize(bytes)?;
        Ok(Self { names })
    }
}

/// Persistent registry of channel names
///
/// Mutations are read-modify-write on a single record, so they run under
/// `guard`; readers go straight to the store.
pub struct ChannelRegistry {
    store: Arc<dyn KvStore>,
    write_options: WriteOptions,
    guard: Mutex<()>,
}

impl ChannelRegistry {
    pub fn new(store: Arc<dyn KvStore>, write_options: WriteOptions) -> Self {
        Self {
            store,
            write_options,
            guard: Mutex::new(()),
        }
    }

    /// Add `name` if absent; returns whether it was added
    pub fn register(&self, name: &str) -> Result<bool> {
        let _guard = self.guard.lock();

        let mut set = self.load()?;
        if !set.insert(name) {
            return Ok(false);
        }
        self.save(&set)?;

        tracing::debug!("Registered channel {} ({} total)", name, set.len());
        Ok(true)
    }

    /// Remove `name`; `ChannelNotFound` if it is not registered
    pub fn remove(&self, name: &str) -> Result<()> {
        let _guard = self.guard.lock();

        let mut set = self.load()?;
        if !set.remove(name) {
            return Err(QueueError::ChannelNotFound(name.to_string()));
        }
        self.save(&set)?;

        tracing::debug!("Removed channel {} ({} left)", name, set.len());
        Ok(())
    }

    /// Membership test
    ///
    /// A record that cannot be read or decoded counts as "not a channel".
    pub fn exists(&self, name: &str) -> bool {
        match self.load() {
            Ok(set) => set.contains(name),
            Err(e) => {
                tracing::warn!("Registry unreadable, treating {} as unknown: {}", name, e);
                false
            }
        }
    }

    /// Names in registration order; empty when nothing was registered yet
    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self.load()?.into_vec())
    }

    fn load(&self) -> Result<ChannelSet> {
        match self.store.get(REGISTRY_KEY)? {
            Some(bytes) => ChannelSet::decode(&bytes),
            None => Ok(ChannelSet::new()),
        }
    }

    fn save(&self, set: &ChannelSet) -> Result<()> {
        self.store.put(REGISTRY_KEY, &set.encode()?, &self.write_options)
    }
}
