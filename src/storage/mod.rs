//! On-disk state of a node
//!
//! Two JSON documents live in the data directory: the post store and the peer
//! registry. Every read-modify-write against either goes through one shared
//! [`DataLock`], created once per node and handed to each component that
//! touches the files. The lock only ever covers file access; no network I/O
//! happens while it is held.

pub mod json_file;
pub mod peers;
pub mod posts;

use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

pub use peers::{PeerMap, PeerRegistry};
pub use posts::PostStore;

use crate::config::NodeConfig;
use crate::error::Result;

/// Process-wide critical section for the data files
#[derive(Debug, Clone, Default)]
pub struct DataLock {
    inner: Arc<Mutex<()>>,
}

impl DataLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to the data files
    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.inner.lock().await
    }
}

/// Both data files of a node, sharing one lock
#[derive(Debug, Clone)]
pub struct NodeStorage {
    pub posts: PostStore,
    pub peers: PeerRegistry,
}

impl NodeStorage {
    /// Open the data files named by `config` under a fresh lock
    pub fn open(config: &NodeConfig) -> Self {
        let lock = DataLock::new();
        Self {
            posts: PostStore::new(config.posts_path(), config.host_label.clone(), lock.clone()),
            peers: PeerRegistry::new(config.peers_path(), config.peer_ttl_secs, lock),
        }
    }

    /// Create the data directory and both files if absent
    pub async fn ensure(&self) -> Result<()> {
        self.posts.init().await?;
        self.peers.init().await
    }
}
