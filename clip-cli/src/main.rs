//! # clipsync
//!
//! Share one clipboard across machines on a LAN.
//!
//! ## Commands
//!
//! - `relay`: Run the relay every peer connects to
//! - `peer`: Sync this machine's clipboard through a relay
//!
//! ## Example
//!
//! ```bash
//! export CLIPSYNC_SECRET="correct horse battery staple"
//!
//! # On one always-on machine
//! clipsync relay --port 8765
//!
//! # On every machine sharing the clipboard
//! clipsync peer ws://192.168.1.10:8765 --name laptop
//! ```
//!
//! Logging is controlled by `RUST_LOG` (default `info`).

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use clip_core::SharedSecret;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{peer, relay};
use config::FileConfig;

/// Share one clipboard across machines on a LAN.
#[derive(Parser, Debug)]
#[command(name = "clipsync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML config file with [relay] and [peer] tables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Shared secret for signing messages
    #[arg(long, global = true, env = "CLIPSYNC_SECRET", hide_env_values = true)]
    secret: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the relay
    Relay {
        /// Interface to listen on [default: 0.0.0.0]
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on [default: 8765]
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Sync this machine's clipboard through a relay
    Peer {
        /// Relay URL, e.g. ws://192.168.1.10:8765
        url: String,

        /// Host name announced to other peers [default: this machine's name]
        #[arg(long, short)]
        name: Option<String>,

        /// Clipboard poll interval in milliseconds [default: 500]
        #[arg(long)]
        poll_ms: Option<u64>,

        /// Delay between reconnection attempts in milliseconds [default: 2000]
        #[arg(long)]
        reconnect_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let secret = shared_secret(cli.secret)?;
    let file = FileConfig::load_optional(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Relay { host, port } => {
            let config = file.relay_config(host, port)?;
            relay::run(config, &secret).await?;
        }
        Commands::Peer {
            url,
            name,
            poll_ms,
            reconnect_ms,
        } => {
            let config = file.agent_config(&url, name, poll_ms, reconnect_ms)?;
            peer::run(config, &secret).await?;
        }
    }

    Ok(())
}

/// Install the fmt subscriber on stderr, filtered by `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// The secret from `--secret` or `CLIPSYNC_SECRET`. Missing or empty is fatal.
fn shared_secret(value: Option<String>) -> Result<SharedSecret> {
    match value {
        Some(value) if !value.is_empty() => Ok(SharedSecret::new(value)?),
        _ => bail!("No shared secret: set CLIPSYNC_SECRET or pass --secret"),
    }
}
