//! Key layout
//!
//! ```text
//! channel                 registry record
//! <channel>:getpos        head cursor
//! <channel>:setpos        tail cursor
//! <channel>:<sequence>    message record
//! ```
//!
//! Every per-channel key is `<channel>:<suffix>` with a colon-free suffix,
//! so splitting at the last colon recovers the channel. The registry key has
//! no colon at all.
//!
//! The bare `<channel>` key touched by the legacy delivered-record policy is
//! outside this scheme: a name such as `a:getpos` or `a:5` is another
//! channel's key, so the engine never deletes a bare key containing a colon.

use crate::error::{QueueError, Result};

/// Key of the registry record
pub const REGISTRY_KEY: &[u8] = b"channel";

const HEAD_SUFFIX: &str = "getpos";
const TAIL_SUFFIX: &str = "setpos";

pub fn head_key(channel: &str) -> Vec<u8> {
    format!("{}:{}", channel, HEAD_SUFFIX).into_bytes()
}

pub fn tail_key(channel: &str) -> Vec<u8> {
    format!("{}:{}", channel, TAIL_SUFFIX).into_bytes()
}

pub fn message_key(channel: &str, sequence: u64) -> Vec<u8> {
    format!("{}:{}", channel, sequence).into_bytes()
}

/// Key removed by the legacy delivered-record policy
pub fn legacy_delivered_key(channel: &str) -> Vec<u8> {
    channel.as_bytes().to_vec()
}

/// Check a channel name at the request boundary
pub fn validate_channel_name(name: &str, max_len: usize) -> Result<()> {
    if name.is_empty() {
        return Err(QueueError::Validation("channel name is empty".to_string()));
    }
    if name.len() > max_len {
        return Err(QueueError::Validation(format!(
            "channel name is {} bytes (max {})",
            name.len(),
            max_len
        )));
    }
    Ok(())
}
