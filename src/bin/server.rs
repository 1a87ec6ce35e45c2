//! AtlasQ Server Binary
//!
//! Opens the queue store and serves it over TCP.

use std::sync::Arc;

use atlasq::config::{
    CommitMode, DeliveredRecordPolicy, LockGranularity, RecoveryPolicy, WalSyncStrategy,
};
use atlasq::network::Server;
use atlasq::{Config, QueueEngine};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// AtlasQ Server
#[derive(Parser, Debug)]
#[command(name = "atlasq-server")]
#[command(about = "Persistent named-queue server")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./atlasq_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Connections allowed to wait for a worker
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Worker threads serving connections
    #[arg(short, long, default_value = "8")]
    workers: usize,

    /// WAL size in MB that triggers compaction
    #[arg(long, default_value = "64")]
    compaction_mb: u64,

    /// fsync the WAL after every write
    #[arg(long)]
    sync_every_write: bool,

    /// Fail on corrupt position records instead of resetting them to 0
    #[arg(long)]
    strict_positions: bool,

    /// Keep delivered message records on disk
    #[arg(long)]
    retain_delivered: bool,

    /// Commit each record together with its cursor update
    #[arg(long)]
    atomic_commits: bool,

    /// Serialize all channels behind one lock
    #[arg(long)]
    global_lock: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,atlasq=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("AtlasQ Server v{}", atlasq::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .worker_threads(args.workers)
        .compaction_threshold(args.compaction_mb * 1024 * 1024)
        .wal_sync_strategy(if args.sync_every_write {
            WalSyncStrategy::EveryWrite
        } else {
            WalSyncStrategy::EveryNEntries { count: 100 }
        })
        .recovery_policy(if args.strict_positions {
            RecoveryPolicy::Strict
        } else {
            RecoveryPolicy::Lenient
        })
        .delivered_record_policy(if args.retain_delivered {
            DeliveredRecordPolicy::RetainLegacy
        } else {
            DeliveredRecordPolicy::Reclaim
        })
        .commit_mode(if args.atomic_commits {
            CommitMode::Atomic
        } else {
            CommitMode::Sequential
        })
        .lock_granularity(if args.global_lock {
            LockGranularity::Global
        } else {
            LockGranularity::PerChannel
        })
        .build();

    let engine = match QueueEngine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Engine initialized successfully");

    let server = match Server::bind(config, engine) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
