//! Test fixtures for integration tests
//!
//! Spins up nodes on loopback with discovery disabled and helps register
//! them as each other's peers.

use std::time::Duration;

use tempfile::TempDir;
use vnforum::config::{NodeConfig, NodeConfigBuilder};
use vnforum::merge::MergeEngine;
use vnforum::models::{local_time, unix_now, Post};
use vnforum::node::{ForumNode, NodeHandle, PeerClient, StartOutcome, SyncEngine};
use vnforum::storage::NodeStorage;

/// A running node with its data directory
pub struct TestNode {
    pub dir: TempDir,
    pub storage: NodeStorage,
    pub handle: NodeHandle,
}

impl TestNode {
    pub fn base_url(&self) -> String {
        self.handle.base_url()
    }

    pub fn port(&self) -> u16 {
        self.handle.local_addr().port()
    }

    /// A sync engine over this node's files, for driving rounds by hand
    pub fn sync_engine(&self) -> SyncEngine {
        SyncEngine::new(
            self.storage.peers.clone(),
            MergeEngine::new(self.storage.posts.clone()),
            PeerClient::new(Duration::from_millis(2500)).unwrap(),
            Duration::from_secs(12),
        )
    }

    /// Register `other` as a live peer of this node
    pub async fn add_peer(&self, other: &TestNode, label: &str) {
        self.storage
            .peers
            .upsert_at("127.0.0.1", other.port(), label, unix_now())
            .await
            .unwrap();
    }

    /// Append a post to the local store, as a front-end would
    pub async fn create_post(&self, post: Post) {
        let mut posts = self.storage.posts.load().await.unwrap();
        posts.insert(0, post);
        self.storage.posts.save(&posts).await.unwrap();
    }

    pub async fn shutdown(self) {
        self.handle.shutdown().await.unwrap();
    }
}

/// Builder for a loopback node on an ephemeral port
pub fn node_config(dir: &TempDir, label: &str) -> NodeConfigBuilder {
    NodeConfig::builder()
        .service_port(0)
        .bind_ip("127.0.0.1".parse().unwrap())
        .data_dir(dir.path())
        .host_label(label)
        .enable_discovery(false)
        .enable_request_logging(false)
}

/// Start a node labelled `label` in a fresh data directory
pub async fn start_node(label: &str) -> TestNode {
    start_node_with(label, |builder| builder).await
}

/// Start a node after adjusting its config
pub async fn start_node_with<F>(label: &str, configure: F) -> TestNode
where
    F: FnOnce(NodeConfigBuilder) -> NodeConfigBuilder,
{
    let dir = TempDir::new().unwrap();
    let config = configure(node_config(&dir, label)).build().unwrap();
    let node = ForumNode::new(config).unwrap();
    let storage = node.storage().clone();

    match node.start().await.unwrap() {
        StartOutcome::Started(handle) => TestNode {
            dir,
            storage,
            handle,
        },
        StartOutcome::AlreadyRunning(status) => {
            panic!("unexpected running node on an ephemeral port: {status:?}")
        }
    }
}

/// Post created by `origin` at `created_ts`
pub fn authored_post(id: &str, origin: &str, created_ts: i64) -> Post {
    let mut post = Post::new(
        format!("Post {id}"),
        "Xin chào từ mạng LAN",
        "tester",
        origin,
        local_time(created_ts),
    );
    post.id = id.to_string();
    post
}
