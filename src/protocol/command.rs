//! Command definitions
//!
//! Represents commands from clients.

use bytes::Bytes;

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Enqueue = 0x01,
    Dequeue = 0x02,
    ListChannels = 0x03,
    Depth = 0x04,
    Status = 0x05,
    Ping = 0x06,
}

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Append a value to a channel
    Enqueue { channel: String, value: Bytes },

    /// Take the oldest value from a channel
    Dequeue { channel: String },

    /// List registered channels
    ListChannels,

    /// Pending message count of a channel
    Depth { channel: String },

    /// Cursors of every channel
    Status,

    /// Ping (health check)
    Ping,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Enqueue { .. } => CommandType::Enqueue,
            Command::Dequeue { .. } => CommandType::Dequeue,
            Command::ListChannels => CommandType::ListChannels,
            Command::Depth { .. } => CommandType::Depth,
            Command::Status => CommandType::Status,
            Command::Ping => CommandType::Ping,
        }
    }

    /// Channel the command targets, if any
    pub fn channel(&self) -> Option<&str> {
        match self {
            Command::Enqueue { channel, .. }
            | Command::Dequeue { channel }
            | Command::Depth { channel } => Some(channel),
            Command::ListChannels | Command::Status | Command::Ping => None,
        }
    }
}
