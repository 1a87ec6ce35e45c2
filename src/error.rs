//! Error types for AtlasQ
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using QueueError
pub type Result<T> = std::result::Result<T, QueueError>;

/// Unified error type for AtlasQ operations
#[derive(Debug, Error)]
pub enum QueueError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Queue Errors
    // -------------------------------------------------------------------------
    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("Queue is empty: {0}")]
    QueueEmpty(String),

    #[error("Message {sequence} missing from channel {channel}")]
    MessageNotFound { channel: String, sequence: u64 },

    #[error("Corrupt position record {key}: {raw:?}")]
    CorruptPosition { key: String, raw: String },

    #[error("Validation error: {0}")]
    Validation(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl QueueError {
    /// True for failures of the underlying store (read, write, decode).
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            QueueError::Io(_)
                | QueueError::WalCorruption(_)
                | QueueError::Storage(_)
                | QueueError::Serialization(_)
        )
    }
}

impl From<bincode::Error> for QueueError {
    fn from(e: bincode::Error) -> Self {
        QueueError::Serialization(e.to_string())
    }
}
