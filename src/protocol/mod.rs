//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format (V1 - Simple Binary)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x01: ENQUEUE - Payload: chan_len (4) + channel + value
//! - 0x02: DEQUEUE - Payload: chan_len (4) + channel
//! - 0x03: LIST    - Payload: empty
//! - 0x04: DEPTH   - Payload: chan_len (4) + channel
//! - 0x05: STATUS  - Payload: empty
//! - 0x06: PING    - Payload: empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: NOT_FOUND (unknown channel)
//! - 0x02: EMPTY (channel has no pending messages)
//! - 0x03: ERROR
//! - 0x04: INVALID (bad channel name or malformed request)

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{Response, Status};
pub use codec::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
