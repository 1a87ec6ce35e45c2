//! TCP Server
//!
//! Accepts connections and dispatches them to worker threads.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, TrySendError};

use crate::config::Config;
use crate::engine::QueueEngine;
use crate::error::{QueueError, Result};
use crate::protocol::{write_response, Response};

use super::Connection;

/// How long the acceptor sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// TCP server for AtlasQ
///
/// ## Threads
/// - The caller of `run` accepts connections
/// - `worker_threads` workers serve them, fed by a bounded crossbeam channel
///   of `max_connections` slots; when it is full new clients get an ERROR
pub struct Server {
    config: Config,
    engine: Arc<QueueEngine>,
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
}

/// Stops a running server from another thread
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl Server {
    /// Bind the listen address from `config`
    pub fn bind(config: Config, engine: Arc<QueueEngine>) -> Result<Self> {
        if config.worker_threads == 0 {
            return Err(QueueError::Config("worker_threads must be at least 1".to_string()));
        }

        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            QueueError::Network(format!("cannot bind {}: {}", config.listen_addr, e))
        })?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            engine,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
        }
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Serve until shutdown is signalled (blocking)
    ///
    /// Workers finish their current connections before this returns.
    pub fn run(&self) -> Result<()> {
        tracing::info!(
            "Listening on {} with {} workers",
            self.local_addr()?,
            self.config.worker_threads
        );

        let (tx, rx) = channel::bounded::<TcpStream>(self.config.max_connections.max(1));

        let mut workers = Vec::with_capacity(self.config.worker_threads);
        for id in 0..self.config.worker_threads {
            let rx = rx.clone();
            let engine = Arc::clone(&self.engine);
            let timeouts = (self.config.read_timeout_ms, self.config.write_timeout_ms);
            let handle = thread::Builder::new()
                .name(format!("atlasq-worker-{}", id))
                .spawn(move || worker_loop(rx, engine, timeouts))?;
            workers.push(handle);
        }
        drop(rx);

        while !self.shutdown.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    stream.set_nonblocking(false)?;
                    match tx.try_send(stream) {
                        Ok(()) => tracing::trace!("Queued connection from {}", addr),
                        Err(TrySendError::Full(mut stream)) => {
                            tracing::warn!("Connection limit reached, rejecting {}", addr);
                            let _ = write_response(&mut stream, &Response::error("server busy"));
                        }
                        Err(TrySendError::Disconnected(_)) => {
                            tracing::error!("All workers exited, stopping acceptor");
                            break;
                        }
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => tracing::warn!("Accept failed: {}", e),
            }
        }

        drop(tx);
        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }

        if let Err(e) = self.engine.close() {
            tracing::error!("Failed to sync store on shutdown: {}", e);
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}

fn worker_loop(rx: Receiver<TcpStream>, engine: Arc<QueueEngine>, (read_ms, write_ms): (u64, u64)) {
    for stream in rx.iter() {
        let mut connection = match Connection::new(stream, Arc::clone(&engine)) {
            Ok(connection) => connection,
            Err(e) => {
                tracing::warn!("Failed to set up connection: {}", e);
                continue;
            }
        };

        if let Err(e) = connection.set_timeouts(read_ms, write_ms) {
            tracing::warn!("Failed to set timeouts for {}: {}", connection.peer_addr(), e);
            continue;
        }

        if let Err(e) = connection.handle() {
            tracing::debug!("Connection {} closed with error: {}", connection.peer_addr(), e);
        }
    }
}
