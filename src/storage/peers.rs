//! Peer liveness registry kept in a single JSON file
//!
//! Keys are the addresses hellos were observed from; values carry the
//! advertised port and host label plus the time of the last hello. Entries
//! whose last hello is older than the TTL are evicted on the next read.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{unix_now, PeerRecord};

use super::json_file::{read_json, write_json_atomic};
use super::DataLock;

/// Live peers keyed by observed address
pub type PeerMap = BTreeMap<String, PeerRecord>;

/// The peer registry file and the lock guarding it
#[derive(Debug, Clone)]
pub struct PeerRegistry {
    path: PathBuf,
    ttl_secs: i64,
    lock: DataLock,
}

impl PeerRegistry {
    /// Create a registry over `path`, sharing `lock` with every other data file
    pub fn new(path: impl Into<PathBuf>, ttl_secs: u64, lock: DataLock) -> Self {
        Self {
            path: path.into(),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
            lock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Create the file holding an empty registry if it does not exist
    pub async fn init(&self) -> Result<()> {
        let _guard = self.lock.acquire().await;
        if read_json::<PeerMap>(&self.path).await?.is_none() {
            self.save_unlocked(&PeerMap::new()).await?;
        }
        Ok(())
    }

    /// Record a hello from `address`; returns true if the peer was unknown
    pub async fn upsert(&self, address: &str, port: u16, host: &str) -> Result<bool> {
        self.upsert_at(address, port, host, unix_now()).await
    }

    /// [`upsert`](Self::upsert) with an explicit clock
    pub async fn upsert_at(&self, address: &str, port: u16, host: &str, now: i64) -> Result<bool> {
        let _guard = self.lock.acquire().await;
        let mut peers = read_json::<PeerMap>(&self.path).await?.unwrap_or_default();

        let record = PeerRecord {
            port,
            host: host.to_string(),
            last_seen: now,
        };
        let is_new = peers.insert(address.to_string(), record).is_none();

        self.save_unlocked(&peers).await?;
        Ok(is_new)
    }

    /// Evict expired peers, persist the eviction, return the survivors
    pub async fn live(&self) -> Result<PeerMap> {
        self.live_at(unix_now()).await
    }

    /// [`live`](Self::live) with an explicit clock
    pub async fn live_at(&self, now: i64) -> Result<PeerMap> {
        let _guard = self.lock.acquire().await;
        let stored = read_json::<PeerMap>(&self.path).await?;
        let missing = stored.is_none();
        let mut peers = stored.unwrap_or_default();

        let before = peers.len();
        peers.retain(|_, record| record.is_live(now, self.ttl_secs));
        let evicted = before - peers.len();

        if evicted > 0 || missing {
            self.save_unlocked(&peers).await?;
        }
        if evicted > 0 {
            tracing::debug!(evicted, remaining = peers.len(), "Evicted expired peers");
        }

        Ok(peers)
    }

    async fn save_unlocked(&self, peers: &PeerMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        write_json_atomic(&self.path, peers).await
    }
}
