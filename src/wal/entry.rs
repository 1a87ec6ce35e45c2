//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries and their framing.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{QueueError, Result};

/// Frame header: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// Upper bound for a single frame body (256 MB)
pub(crate) const MAX_ENTRY_SIZE: u32 = 256 * 1024 * 1024;

/// A single entry in the WAL
///
/// An entry carries every mutation of one store write, so replay applies a
/// batch all-or-nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The operations to apply, in order
    pub operations: Vec<Operation>,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Put a key-value pair
    Put { key: Vec<u8>, value: Vec<u8> },

    /// Delete a key
    Delete { key: Vec<u8> },
}

impl Operation {
    /// Key touched by this operation
    pub fn key(&self) -> &[u8] {
        match self {
            Operation::Put { key, .. } => key,
            Operation::Delete { key } => key,
        }
    }
}

impl WalEntry {
    pub fn new(lsn: u64, operations: Vec<Operation>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            operations,
            timestamp,
        }
    }

    /// Encode into a framed record: `LSN | CRC | Len | bincode body`
    pub fn encode(&self) -> Result<Vec<u8>> {
        let body = bincode::serialize(self)?;
        if body.len() as u64 > MAX_ENTRY_SIZE as u64 {
            return Err(QueueError::Storage(format!(
                "WAL entry too large: {} bytes (max {})",
                body.len(),
                MAX_ENTRY_SIZE
            )));
        }

        let mut frame = Vec::with_capacity(HEADER_SIZE + body.len());
        frame.extend_from_slice(&self.lsn.to_le_bytes());
        frame.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
        frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
        frame.extend_from_slice(&body);
        Ok(frame)
    }

    /// Decode a frame body after its header has been checked
    pub fn decode(lsn: u64, crc: u32, body: &[u8]) -> Result<Self> {
        let actual = crc32fast::hash(body);
        if actual != crc {
            return Err(QueueError::WalCorruption(format!(
                "CRC mismatch at lsn {}: stored {:08x}, computed {:08x}",
                lsn, crc, actual
            )));
        }

        let entry: WalEntry = bincode::deserialize(body)
            .map_err(|e| QueueError::WalCorruption(format!("undecodable entry {}: {}", lsn, e)))?;

        if entry.lsn != lsn {
            return Err(QueueError::WalCorruption(format!(
                "LSN mismatch: header {}, body {}",
                lsn, entry.lsn
            )));
        }

        Ok(entry)
    }
}
