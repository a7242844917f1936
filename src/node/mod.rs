//! The forum sync node
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 Forum Node                   │
//! │                                              │
//! │  Startup Guard ── probe GET /status          │
//! │                                              │
//! │  Broadcaster ──► UDP hello (every 6s)        │
//! │  Listener    ◄── UDP hello ──► Peer Registry │
//! │  Sync Engine ── GET /posts per live peer     │
//! │                 ──► Merge Engine ──► Store   │
//! │                                              │
//! │  Sync Service (HTTP)                         │
//! │    GET  /status  /posts  /peers              │
//! │    POST /merge                               │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use vnforum::config::NodeConfig;
//! use vnforum::node::{ForumNode, StartOutcome};
//!
//! let node = ForumNode::new(NodeConfig::from_env()?)?;
//! if let StartOutcome::Started(handle) = node.start().await? {
//!     handle.wait().await?;
//! }
//! ```

pub mod api;
pub mod client;
pub mod guard;
pub mod server;
pub mod sync;

pub use api::{ErrorResponse, MergeResponse, StatusResponse};
pub use client::PeerClient;
pub use guard::{ProbeOutcome, StartupGuard};
pub use server::{AppState, ForumNode, NodeHandle, NodeInfo, StartOutcome};
pub use sync::{RoundReport, SyncEngine};
