//! Peer command - sync this machine's clipboard through a relay.

use anyhow::{Context, Result};
use clip_agent::{AgentConfig, PeerAgent, SystemClipboard, WsTransport};
use clip_core::{Authenticator, SharedSecret};

/// Run the peer agent until interrupted.
pub async fn run(config: AgentConfig, secret: &SharedSecret) -> Result<()> {
    let auth = Authenticator::new(secret).context("Invalid shared secret")?;
    let clipboard = SystemClipboard::new().context("Cannot open the system clipboard")?;
    let agent = PeerAgent::new(config, auth, WsTransport::new(), clipboard)?;

    tokio::select! {
        _ = agent.run() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
        }
    }
    Ok(())
}
