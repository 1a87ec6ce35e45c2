//! Connection Handler
//!
//! Serves one client: read command, run it against the engine, reply.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::QueueEngine;
use crate::error::{QueueError, Result};
use crate::protocol::{read_command, write_response, Command, Response};

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Engine shared by all connections
    engine: Arc<QueueEngine>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(stream: TcpStream, engine: Arc<QueueEngine>) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            engine,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 disables a timeout)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let to_duration = |ms: u64| (ms > 0).then(|| Duration::from_millis(ms));

        self.reader.get_ref().set_read_timeout(to_duration(read_ms))?;
        self.writer.get_ref().set_write_timeout(to_duration(write_ms))?;
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Returns when the client disconnects, goes idle past the read timeout,
    /// or an unrecoverable error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let command = match read_command(&mut self.reader) {
                Ok(cmd) => cmd,
                Err(QueueError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} went away ({:?})", self.peer_addr, e.kind());
                    return Ok(());
                }
                Err(e @ QueueError::Protocol(_)) => {
                    // Framing is lost after a bad request; reply and hang up
                    tracing::warn!("Bad request from {}: {}", self.peer_addr, e);
                    let _ = self.send_response(Response::from_error(&e));
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            tracing::trace!("Received command from {}: {:?}", self.peer_addr, command);

            let response = self.execute_command(command);

            if let Err(e) = self.send_response(response) {
                if let QueueError::Io(ref io_err) = e {
                    if is_disconnect(io_err.kind()) {
                        tracing::debug!(
                            "Client {} disconnected before response could be sent",
                            self.peer_addr
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Execute a command and return a response
    fn execute_command(&self, command: Command) -> Response {
        match self.engine.execute(command) {
            Ok(response) => response,
            Err(e) => {
                if e.is_storage() {
                    tracing::error!("Storage failure serving {}: {}", self.peer_addr, e);
                } else {
                    tracing::debug!("Request from {} failed: {}", self.peer_addr, e);
                }
                Response::from_error(&e)
            }
        }
    }

    /// Send a response to the client
    fn send_response(&mut self, response: Response) -> Result<()> {
        write_response(&mut self.writer, &response)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// Errors that just mean the peer is gone or idle
fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::WouldBlock
            | ErrorKind::TimedOut
    )
}
