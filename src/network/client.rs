//! Blocking client
//!
//! One request at a time over a single TCP connection.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use bytes::Bytes;

use crate::error::{QueueError, Result};
use crate::protocol::{read_response, write_command, Command, Response, Status};
use crate::queue::ChannelStatus;

/// Client for an AtlasQ server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| QueueError::Network(format!("connect failed: {}", e)))?;
        stream.set_nodelay(true)?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
        })
    }

    /// Send a command and return the raw response
    pub fn request(&mut self, command: &Command) -> Result<Response> {
        write_command(&mut self.writer, command)?;
        read_response(&mut self.reader)
    }

    /// Enqueue a value; returns its sequence number
    pub fn enqueue(&mut self, channel: &str, value: impl Into<Bytes>) -> Result<u64> {
        let response = self.request(&Command::Enqueue {
            channel: channel.to_string(),
            value: value.into(),
        })?;
        expect_ok(response)?.as_u64()
    }

    pub fn dequeue(&mut self, channel: &str) -> Result<Bytes> {
        let response = self.request(&Command::Dequeue {
            channel: channel.to_string(),
        })?;
        let response = expect_ok(response)?;
        Ok(response.payload.map(Bytes::from).unwrap_or_default())
    }

    pub fn list_channels(&mut self) -> Result<Vec<String>> {
        expect_ok(self.request(&Command::ListChannels)?)?.as_channels()
    }

    pub fn depth(&mut self, channel: &str) -> Result<u64> {
        let response = self.request(&Command::Depth {
            channel: channel.to_string(),
        })?;
        expect_ok(response)?.as_u64()
    }

    pub fn status(&mut self) -> Result<Vec<ChannelStatus>> {
        expect_ok(self.request(&Command::Status)?)?.as_status()
    }

    pub fn ping(&mut self) -> Result<()> {
        expect_ok(self.request(&Command::Ping)?).map(|_| ())
    }
}

/// Turn a non-OK response back into the matching error
fn expect_ok(response: Response) -> Result<Response> {
    let message = response.message();
    match response.status {
        Status::Ok => Ok(response),
        Status::NotFound => Err(QueueError::ChannelNotFound(message)),
        Status::Empty => Err(QueueError::QueueEmpty(message)),
        Status::Invalid => Err(QueueError::Validation(message)),
        Status::Error => Err(QueueError::Storage(message)),
    }
}
