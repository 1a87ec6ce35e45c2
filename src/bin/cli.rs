//! AtlasQ CLI Client
//!
//! Command-line interface for interacting with AtlasQ.

use std::process::ExitCode;

use atlasq::network::Client;
use atlasq::Result;
use clap::{Parser, Subcommand};

/// AtlasQ CLI
#[derive(Parser, Debug)]
#[command(name = "atlasq-cli")]
#[command(about = "CLI for the AtlasQ queue server")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Append a value to a channel
    Enqueue {
        /// Channel name
        channel: String,

        /// The value to enqueue
        value: String,
    },

    /// Take the oldest value from a channel
    Dequeue {
        /// Channel name
        channel: String,
    },

    /// List registered channels
    List,

    /// Show the pending message count of a channel
    Depth {
        /// Channel name
        channel: String,
    },

    /// Show cursors of every channel
    Status,

    /// Ping the server
    Ping,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut client = Client::connect(&args.server)?;

    match args.command {
        Commands::Enqueue { channel, value } => {
            let sequence = client.enqueue(&channel, value.into_bytes())?;
            println!("{}:{}", channel, sequence);
        }
        Commands::Dequeue { channel } => {
            let value = client.dequeue(&channel)?;
            println!("{}", String::from_utf8_lossy(&value));
        }
        Commands::List => {
            for name in client.list_channels()? {
                println!("{}", name);
            }
        }
        Commands::Depth { channel } => {
            println!("{}", client.depth(&channel)?);
        }
        Commands::Status => {
            println!("{:<40} {:>10} {:>10} {:>10}", "channel", "head", "tail", "depth");
            for status in client.status()? {
                println!(
                    "{:<40} {:>10} {:>10} {:>10}",
                    status.name, status.head, status.tail, status.depth
                );
            }
        }
        Commands::Ping => {
            client.ping()?;
            println!("PONG");
        }
    }

    Ok(())
}
