//! Response definitions
//!
//! Represents responses to clients.

use crate::error::{QueueError, Result};
use crate::queue::ChannelStatus;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    NotFound = 0x01,
    Empty = 0x02,
    Error = 0x03,
    Invalid = 0x04,
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional payload (result for OK, message otherwise)
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// Create an OK response with optional payload
    pub fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    /// OK carrying a big-endian u64 (sequence numbers, depths)
    pub fn ok_u64(value: u64) -> Self {
        Self::ok(Some(value.to_be_bytes().to_vec()))
    }

    pub fn ok_channels(names: &[String]) -> Result<Self> {
        Ok(Self::ok(Some(bincode::serialize(names)?)))
    }

    pub fn ok_status(channels: &[ChannelStatus]) -> Result<Self> {
        Ok(Self::ok(Some(bincode::serialize(channels)?)))
    }

    pub fn not_found(message: &str) -> Self {
        Self::with_message(Status::NotFound, message)
    }

    pub fn empty(message: &str) -> Self {
        Self::with_message(Status::Empty, message)
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self::with_message(Status::Error, message)
    }

    pub fn invalid(message: &str) -> Self {
        Self::with_message(Status::Invalid, message)
    }

    /// Map an engine error onto a status code
    pub fn from_error(error: &QueueError) -> Self {
        let message = error.to_string();
        match error {
            QueueError::ChannelNotFound(_) => Self::not_found(&message),
            QueueError::QueueEmpty(_) => Self::empty(&message),
            QueueError::Validation(_) | QueueError::Protocol(_) => Self::invalid(&message),
            _ => Self::error(&message),
        }
    }

    /// Payload as a big-endian u64
    pub fn as_u64(&self) -> Result<u64> {
        match self.payload.as_deref() {
            Some(&[a, b, c, d, e, f, g, h]) => Ok(u64::from_be_bytes([a, b, c, d, e, f, g, h])),
            _ => Err(QueueError::Protocol(
                "expected an 8-byte integer payload".to_string(),
            )),
        }
    }

    pub fn as_channels(&self) -> Result<Vec<String>> {
        Ok(bincode::deserialize(self.payload.as_deref().unwrap_or(&[]))?)
    }

    pub fn as_status(&self) -> Result<Vec<ChannelStatus>> {
        Ok(bincode::deserialize(self.payload.as_deref().unwrap_or(&[]))?)
    }

    /// Payload as text, for error messages
    pub fn message(&self) -> String {
        self.payload
            .as_deref()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .unwrap_or_default()
    }

    fn with_message(status: Status, message: &str) -> Self {
        Self {
            status,
            payload: Some(message.as_bytes().to_vec()),
        }
    }
}
