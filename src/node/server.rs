//! Node bootstrap and lifecycle
//!
//! `Start → Probe → {AlreadyRunning} | {Bootstrapped → Serving}`. Serving
//! lasts until the process ends or, for in-process use, until
//! [`NodeHandle::shutdown`] is called.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::config::NodeConfig;
use crate::discovery::{Broadcaster, Listener};
use crate::error::{Error, Result};
use crate::merge::MergeEngine;
use crate::shutdown::{self, ShutdownTrigger};
use crate::storage::NodeStorage;

use super::api::{create_router, StatusResponse};
use super::client::PeerClient;
use super::guard::{ProbeOutcome, StartupGuard};
use super::sync::SyncEngine;

// ============================================================================
// App State
// ============================================================================

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    /// Post store and peer registry
    pub storage: NodeStorage,

    /// Merge engine over the post store
    pub merge: MergeEngine,

    /// Label reported by `/status`
    pub host_label: String,

    /// Port the service is actually bound to
    pub port: u16,
}

// ============================================================================
// Forum Node
// ============================================================================

/// What [`ForumNode::start`] ended up doing
#[derive(Debug)]
pub enum StartOutcome {
    /// A healthy node already answers on the configured port; nothing started
    AlreadyRunning(StatusResponse),
    /// This node is serving
    Started(NodeHandle),
}

/// A forum sync node before it starts
pub struct ForumNode {
    config: NodeConfig,
    storage: NodeStorage,
}

impl ForumNode {
    /// Create a node; the data files are opened but not touched yet
    pub fn new(config: NodeConfig) -> Result<Self> {
        config.validate()?;
        let storage = NodeStorage::open(&config);
        Ok(Self { config, storage })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn storage(&self) -> &NodeStorage {
        &self.storage
    }

    /// Initialize storage, probe for a running node, then bootstrap
    ///
    /// Nothing is bound or spawned when the probe finds a healthy node.
    pub async fn start(self) -> Result<StartOutcome> {
        self.storage.ensure().await?;

        let guard = StartupGuard::new(self.config.local_status_addr(), self.config.probe_timeout())?;
        if let ProbeOutcome::AlreadyRunning(status) = guard.probe().await {
            tracing::info!(host = %status.host, port = status.port, "Node already running, exiting");
            return Ok(StartOutcome::AlreadyRunning(status));
        }

        let addr = self.config.service_addr();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        tracing::info!(
            addr = %local_addr,
            host = %self.config.host_label,
            data_dir = %self.config.data_dir.display(),
            "Starting forum node"
        );

        let (trigger, stop) = ShutdownTrigger::new();
        let merge = MergeEngine::new(self.storage.posts.clone());
        let mut tasks = Vec::new();

        if self.config.enable_discovery {
            let broadcaster = Broadcaster::new(&self.config, local_addr.port());
            tasks.push(spawn_task("broadcaster", broadcaster.run(stop.clone())));

            let hello_listener = Listener::new(&self.config, self.storage.peers.clone());
            tasks.push(spawn_task("listener", hello_listener.run(stop.clone())));
        }

        let sync = SyncEngine::new(
            self.storage.peers.clone(),
            merge.clone(),
            PeerClient::new(self.config.fetch_timeout())?,
            self.config.sync_interval(),
        );
        tasks.push(spawn_task("sync", sync.run(stop.clone())));

        let state = AppState {
            storage: self.storage.clone(),
            merge,
            host_label: self.config.host_label.clone(),
            port: local_addr.port(),
        };
        let router = build_router(state, self.config.enable_request_logging);

        let mut server_stop = stop;
        let server = spawn_task("service", async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown::requested(&mut server_stop).await })
                .await?;
            Ok::<(), Error>(())
        });

        Ok(StartOutcome::Started(NodeHandle {
            local_addr,
            trigger,
            tasks,
            server,
        }))
    }
}

/// Build the router with all routes
pub fn build_router(state: AppState, request_logging: bool) -> Router {
    let router = create_router(state);
    if request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Spawn a background task whose failure is logged and ends only that task
fn spawn_task<F>(name: &'static str, task: F) -> JoinHandle<Result<()>>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        let result = task.await;
        if let Err(e) = &result {
            tracing::error!(task = name, error = %e, category = e.category().as_str(), "Task terminated");
        }
        result
    })
}

// ============================================================================
// Node Handle
// ============================================================================

/// A running node
#[derive(Debug)]
pub struct NodeHandle {
    local_addr: SocketAddr,
    trigger: ShutdownTrigger,
    tasks: Vec<JoinHandle<Result<()>>>,
    server: JoinHandle<Result<()>>,
}

impl NodeHandle {
    /// Address the sync service is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Loopback URL of the sync service
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.local_addr.port())
    }

    /// Serve until the service task ends
    pub async fn wait(self) -> Result<()> {
        let result = join(self.server).await;
        // Keep the trigger alive for as long as the service runs
        drop(self.trigger);
        result
    }

    /// Stop every background task and the service, then wait for them
    pub async fn shutdown(self) -> Result<()> {
        self.trigger.fire();

        let mut first_error = None;
        for task in self.tasks {
            if let Err(e) = join(task).await {
                first_error.get_or_insert(e);
            }
        }
        if let Err(e) = join(self.server).await {
            first_error.get_or_insert(e);
        }

        tracing::info!(addr = %self.local_addr, "Forum node stopped");
        first_error.map_or(Ok(()), Err)
    }
}

async fn join(task: JoinHandle<Result<()>>) -> Result<()> {
    match task.await {
        Ok(result) => result,
        Err(e) => Err(Error::Io(std::io::Error::other(e))),
    }
}

// ============================================================================
// Node Info
// ============================================================================

/// Summary printed when a node starts from the CLI
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub service_addr: SocketAddr,
    pub discovery_port: u16,
    pub host_label: String,
    pub data_dir: String,
    pub sync_interval_secs: u64,
    pub peer_ttl_secs: u64,
}

impl NodeInfo {
    pub fn from_config(config: &NodeConfig) -> Self {
        Self {
            service_addr: config.service_addr(),
            discovery_port: config.discovery_port,
            host_label: config.host_label.clone(),
            data_dir: config.data_dir.display().to_string(),
            sync_interval_secs: config.sync_interval_secs,
            peer_ttl_secs: config.peer_ttl_secs,
        }
    }

    /// Format as display string
    pub fn display(&self) -> String {
        format!(
            "Forum Node\n\
             {:-<40}\n\
             Service Address: {}\n\
             Discovery Port: {}\n\
             Host Label: {}\n\
             Data Directory: {}\n\
             Sync Interval: {}s\n\
             Peer TTL: {}s",
            "",
            self.service_addr,
            self.discovery_port,
            self.host_label,
            self.data_dir,
            self.sync_interval_secs,
            self.peer_ttl_secs
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
