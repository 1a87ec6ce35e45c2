//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Command Type
//! - ENQUEUE: chan_len (4 bytes) + channel + value
//! - DEQUEUE: chan_len (4 bytes) + channel
//! - DEPTH:   chan_len (4 bytes) + channel
//! - LIST, STATUS, PING: empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```

use std::io::{Read, Write};

use bytes::Bytes;

use crate::error::{QueueError, Result};

use super::{Command, Response, Status};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: cmd_type (1) + payload_len (4) + payload
pub fn encode_command(command: &Command) -> Vec<u8> {
    let cmd_type = command.command_type() as u8;

    let payload = match command {
        Command::Enqueue { channel, value } => {
            let mut payload = channel_payload(channel, value.len());
            payload.extend_from_slice(value);
            payload
        }
        Command::Dequeue { channel } | Command::Depth { channel } => channel_payload(channel, 0),
        Command::ListChannels | Command::Status | Command::Ping => Vec::new(),
    };

    frame(cmd_type, &payload)
}

/// Decode a command from bytes
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (cmd_type, payload) = split_frame(bytes, "command")?;

    match cmd_type {
        0x01 => {
            let (channel, rest) = decode_channel(payload, "ENQUEUE")?;
            Ok(Command::Enqueue {
                channel,
                value: Bytes::copy_from_slice(rest),
            })
        }
        0x02 => {
            let channel = decode_channel_only(payload, "DEQUEUE")?;
            Ok(Command::Dequeue { channel })
        }
        0x03 => expect_empty(payload, "LIST").map(|_| Command::ListChannels),
        0x04 => {
            let channel = decode_channel_only(payload, "DEPTH")?;
            Ok(Command::Depth { channel })
        }
        0x05 => expect_empty(payload, "STATUS").map(|_| Command::Status),
        0x06 => expect_empty(payload, "PING").map(|_| Command::Ping),
        _ => Err(QueueError::Protocol(format!(
            "Unknown command type: 0x{:02x}",
            cmd_type
        ))),
    }
}

/// Build `chan_len + channel`, reserving room for `extra` trailing bytes
fn channel_payload(channel: &str, extra: usize) -> Vec<u8> {
    let mut payload = Vec::with_capacity(4 + channel.len() + extra);
    payload.extend_from_slice(&(channel.len() as u32).to_be_bytes());
    payload.extend_from_slice(channel.as_bytes());
    payload
}

/// Split `chan_len + channel + rest`
fn decode_channel<'a>(payload: &'a [u8], name: &str) -> Result<(String, &'a [u8])> {
    if payload.len() < 4 {
        return Err(QueueError::Protocol(format!(
            "{} command: missing channel length",
            name
        )));
    }

    let chan_len = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]) as usize;

    if payload.len() < 4 + chan_len {
        return Err(QueueError::Protocol(format!(
            "{} command: incomplete channel (expected {}, got {})",
            name,
            chan_len,
            payload.len() - 4
        )));
    }

    let channel = std::str::from_utf8(&payload[4..4 + chan_len])
        .map_err(|_| QueueError::Protocol(format!("{} command: channel is not UTF-8", name)))?
        .to_string();

    Ok((channel, &payload[4 + chan_len..]))
}

fn decode_channel_only(payload: &[u8], name: &str) -> Result<String> {
    let (channel, rest) = decode_channel(payload, name)?;
    if !rest.is_empty() {
        return Err(QueueError::Protocol(format!(
            "{} command: {} trailing bytes",
            name,
            rest.len()
        )));
    }
    Ok(channel)
}

fn expect_empty(payload: &[u8], name: &str) -> Result<()> {
    if !payload.is_empty() {
        return Err(QueueError::Protocol(format!(
            "{} command: unexpected payload of {} bytes",
            name,
            payload.len()
        )));
    }
    Ok(())
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Vec<u8> {
    let payload = response.payload.as_deref().unwrap_or(&[]);
    frame(response.status as u8, payload)
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = split_frame(bytes, "response")?;

    let status = match status_byte {
        0x00 => Status::Ok,
        0x01 => Status::NotFound,
        0x02 => Status::Empty,
        0x03 => Status::Error,
        0x04 => Status::Invalid,
        _ => {
            return Err(QueueError::Protocol(format!(
                "Unknown response status: 0x{:02x}",
                status_byte
            )))
        }
    };

    let payload = if payload.is_empty() {
        None
    } else {
        Some(payload.to_vec())
    };

    Ok(Response { status, payload })
}

// =============================================================================
// Framing
// =============================================================================

fn frame(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.push(tag);
    message.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    message.extend_from_slice(payload);
    message
}

/// Validate the header and return `(tag, payload)`
fn split_frame<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(QueueError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let payload_len = payload_len(&bytes[..HEADER_SIZE])?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(QueueError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((bytes[0], &bytes[HEADER_SIZE..total_len]))
}

/// Parse and bound-check the length field of a header
fn payload_len(header: &[u8]) -> Result<usize> {
    let len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);
    if len > MAX_PAYLOAD_SIZE {
        return Err(QueueError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(len as usize)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one complete frame (header + payload) from a stream
fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = payload_len(&header)?;

    let mut message = vec![0u8; HEADER_SIZE + payload_len];
    message[..HEADER_SIZE].copy_from_slice(&header);
    if payload_len > 0 {
        reader.read_exact(&mut message[HEADER_SIZE..])?;
    }
    Ok(message)
}

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    decode_command(&read_frame(reader)?)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    writer.write_all(&encode_command(command))?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    decode_response(&read_frame(reader)?)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(&encode_response(response))?;
    writer.flush()?;
    Ok(())
}
