//! Single-instance check run before a node starts anything

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::Result;

use super::api::StatusResponse;
use super::client::PeerClient;

/// Result of probing the local status endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Another node already answers healthily on this port
    AlreadyRunning(StatusResponse),
    /// No healthy answer; safe to bootstrap
    NotRunning,
}

/// Probes `GET /status` on the local service port
#[derive(Debug, Clone)]
pub struct StartupGuard {
    client: PeerClient,
    base_url: String,
}

impl StartupGuard {
    pub fn new(status_addr: SocketAddr, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: PeerClient::new(timeout)?,
            base_url: format!("http://{status_addr}"),
        })
    }

    /// Any failure (refused, timeout, bad body, `ok: false`) means not running
    pub async fn probe(&self) -> ProbeOutcome {
        match self.client.status(&self.base_url).await {
            Ok(status) if status.ok => ProbeOutcome::AlreadyRunning(status),
            Ok(_) => ProbeOutcome::NotRunning,
            Err(e) => {
                tracing::debug!(url = %self.base_url, error = %e, "No running node found");
                ProbeOutcome::NotRunning
            }
        }
    }
}
