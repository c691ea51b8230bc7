//! Relay command - accept peers and fan clips out between them.

use anyhow::{Context, Result};
use clip_core::{Authenticator, SharedSecret};
use clip_relay::{Config, Relay, RelayServer};
use std::sync::Arc;

/// Run the relay until interrupted.
pub async fn run(config: Config, secret: &SharedSecret) -> Result<()> {
    let auth = Authenticator::new(secret).context("Invalid shared secret")?;
    let address = config.server.bind_address();

    let relay = Arc::new(Relay::new(config, auth));
    let server = RelayServer::bind(relay)
        .await
        .with_context(|| format!("Failed to listen on {}", address))?;

    tokio::select! {
        result = server.run() => result.context("Relay stopped")?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
        }
    }
    Ok(())
}
