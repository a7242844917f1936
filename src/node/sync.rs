//! Periodic pull of posts from every live peer

use std::time::Duration;

use tokio::sync::watch;

use crate::error::Result;
use crate::merge::MergeEngine;
use crate::shutdown;
use crate::storage::PeerRegistry;

use super::client::PeerClient;

/// Outcome of one sync round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundReport {
    /// Live peers at the start of the round
    pub peers: usize,
    /// Peers whose posts were merged
    pub synced: usize,
    /// Peers skipped after a failed fetch
    pub skipped: usize,
    /// Store size after the last merge of the round
    pub total_posts: Option<usize>,
}

/// Pulls `/posts` from each live peer and merges the result locally
#[derive(Debug, Clone)]
pub struct SyncEngine {
    peers: PeerRegistry,
    merge: MergeEngine,
    client: PeerClient,
    interval: Duration,
}

impl SyncEngine {
    pub fn new(peers: PeerRegistry, merge: MergeEngine, client: PeerClient, interval: Duration) -> Self {
        Self {
            peers,
            merge,
            client,
            interval,
        }
    }

    /// Run one round over the current live peers
    ///
    /// A peer that times out, refuses the connection or answers garbage is
    /// skipped for this round only. Storage failures abort the round.
    pub async fn run_round(&self) -> Result<RoundReport> {
        let live = self.peers.live().await?;
        let mut report = RoundReport {
            peers: live.len(),
            ..RoundReport::default()
        };

        for (address, record) in &live {
            let base_url = record.base_url(address);

            let posts = match self.client.posts(&base_url).await {
                Ok(posts) => posts,
                Err(e) if e.is_recoverable() => {
                    tracing::debug!(peer = %base_url, error = %e, "Skipping peer this round");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let received = posts.len();
            let total = self.merge.apply(posts).await?;
            tracing::debug!(peer = %base_url, received, total_posts = total, "Pulled posts");

            report.synced += 1;
            report.total_posts = Some(total);
        }

        Ok(report)
    }

    /// Run a round every interval until `stop` flips to true
    ///
    /// The first round starts immediately.
    pub async fn run(self, mut stop: watch::Receiver<bool>) -> Result<()> {
        let mut interval = shutdown::ticker(self.interval);
        tracing::info!(interval_secs = self.interval.as_secs(), "Sync engine started");

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown::requested(&mut stop) => break,
            }

            let report = self.run_round().await?;
            tracing::debug!(
                peers = report.peers,
                synced = report.synced,
                skipped = report.skipped,
                "Sync round finished"
            );
        }

        tracing::debug!("Sync engine stopped");
        Ok(())
    }
}
