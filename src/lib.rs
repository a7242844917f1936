//! vnforum - serverless forum sync node
//!
//! Instances of the desktop forum running on the same LAN find each other by
//! UDP broadcast and converge on a shared, append-mostly history of posts
//! without any central server.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Node configuration and its sources
//! - [`models`] - Posts, peer records and the discovery hello
//! - [`storage`] - Post store and peer registry files under one lock
//! - [`merge`] - Union-by-id merge of post collections
//! - [`discovery`] - Hello broadcaster and listener
//! - [`node`] - Sync service, sync engine, startup guard and lifecycle
//! - [`shutdown`] - Stop signal for in-process nodes
//! - [`error`] - Unified error type
//!
//! # Example
//!
//! ```no_run
//! use vnforum::config::NodeConfig;
//! use vnforum::node::{ForumNode, StartOutcome};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let node = ForumNode::new(NodeConfig::from_env()?)?;
//!     if let StartOutcome::Started(handle) = node.start().await? {
//!         handle.wait().await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod merge;
pub mod models;
pub mod node;
pub mod shutdown;
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::NodeConfig;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::merge::{merge_posts, MergeEngine};
    pub use crate::models::{HelloMessage, IncomingPost, PeerRecord, Post};
    pub use crate::node::{ForumNode, NodeHandle, PeerClient, StartOutcome};
    pub use crate::storage::{DataLock, NodeStorage, PeerRegistry, PostStore};
}

pub use models::{IncomingPost, PeerRecord, Post};
