//! Configuration management for the forum sync node
//!
//! Only the two ports and the data location are meant to be overridden from
//! the outside (environment, CLI, TOML file). Intervals and timeouts keep their
//! defaults in production and are exposed on the builder for in-process tests.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Default port of the sync service
pub const DEFAULT_SERVICE_PORT: u16 = 17890;

/// Default port of the discovery datagrams
pub const DEFAULT_DISCOVERY_PORT: u16 = 17891;

/// Name of the post store file inside the data directory
pub const POSTS_FILE_NAME: &str = "forum_posts.json";

/// Name of the peer registry file inside the data directory
pub const PEERS_FILE_NAME: &str = "forum_peers.json";

/// Configuration for a forum sync node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Port the sync service listens on
    pub service_port: u16,

    /// Port hello datagrams are sent to and received on
    pub discovery_port: u16,

    /// Address the service and the discovery socket bind to
    pub bind_ip: IpAddr,

    /// Destination of hello datagrams
    pub broadcast_ip: Ipv4Addr,

    /// Directory holding the post store and the peer registry
    pub data_dir: PathBuf,

    /// Label this node advertises and stamps on posts lacking an origin
    pub host_label: String,

    /// Seconds between two hello broadcasts
    pub discovery_interval_secs: u64,

    /// Seconds between two sync rounds
    pub sync_interval_secs: u64,

    /// Seconds after the last hello before a peer is evicted
    pub peer_ttl_secs: u64,

    /// Timeout for pulling posts from one peer, in milliseconds
    pub fetch_timeout_ms: u64,

    /// Timeout of the startup liveness probe, in milliseconds
    pub probe_timeout_ms: u64,

    /// Trace every inbound HTTP request
    pub enable_request_logging: bool,

    /// Run the hello broadcaster and listener
    pub enable_discovery: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            service_port: DEFAULT_SERVICE_PORT,
            discovery_port: DEFAULT_DISCOVERY_PORT,
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            broadcast_ip: Ipv4Addr::BROADCAST,
            data_dir: default_data_dir(),
            host_label: detect_host_label(),
            discovery_interval_secs: 6,
            sync_interval_secs: 12,
            peer_ttl_secs: 90,
            fetch_timeout_ms: 2500,
            probe_timeout_ms: 800,
            enable_request_logging: true,
            enable_discovery: true,
        }
    }
}

impl NodeConfig {
    /// Create a new config builder
    pub fn builder() -> NodeConfigBuilder {
        NodeConfigBuilder::default()
    }

    /// Load configuration from environment variables
    ///
    /// Recognized: `VNFORUM_PORT`, `VNFORUM_DISCOVERY_PORT`, `VNFORUM_DATA_DIR`
    /// and `VNFORUM_HOST`. Everything else keeps its default.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(port) = env_port("VNFORUM_PORT")? {
            config.service_port = port;
        }
        if let Some(port) = env_port("VNFORUM_DISCOVERY_PORT")? {
            config.discovery_port = port;
        }
        if let Ok(dir) = std::env::var("VNFORUM_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse TOML config file {}: {e}", path.display()))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.discovery_interval_secs == 0 {
            return Err(Error::Config("discovery_interval_secs must be greater than 0".into()));
        }
        if self.sync_interval_secs == 0 {
            return Err(Error::Config("sync_interval_secs must be greater than 0".into()));
        }
        if self.peer_ttl_secs <= self.discovery_interval_secs {
            return Err(Error::Config(
                "peer_ttl_secs must be greater than discovery_interval_secs".into(),
            ));
        }
        if self.service_port != 0 && self.service_port == self.discovery_port {
            return Err(Error::Config(format!(
                "service and discovery ports must differ (both {})",
                self.service_port
            )));
        }
        if self.host_label.trim().is_empty() {
            return Err(Error::Config("host_label must not be empty".into()));
        }

        Ok(())
    }

    /// Path of the post store file
    pub fn posts_path(&self) -> PathBuf {
        self.data_dir.join(POSTS_FILE_NAME)
    }

    /// Path of the peer registry file
    pub fn peers_path(&self) -> PathBuf {
        self.data_dir.join(PEERS_FILE_NAME)
    }

    /// Address the sync service binds to
    pub fn service_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.service_port)
    }

    /// Loopback address of this node's sync service, used by the startup probe
    pub fn local_status_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), self.service_port)
    }

    #[must_use]
    pub fn discovery_interval(&self) -> Duration {
        Duration::from_secs(self.discovery_interval_secs)
    }

    #[must_use]
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

fn env_port(name: &str) -> Result<Option<u16>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<u16>()
            .map(Some)
            .map_err(|_| Error::Config(format!("{name} is not a valid port: {value}"))),
        Err(_) => Ok(None),
    }
}

fn default_data_dir() -> PathBuf {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".local").join("share").join("vnde")
}

/// Resolve the label this host advertises
///
/// `VNFORUM_HOST` wins, then `HOSTNAME`, then `/etc/hostname`.
pub fn detect_host_label() -> String {
    let from_env = ["VNFORUM_HOST", "HOSTNAME"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty());

    from_env
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        })
        .unwrap_or_else(|| "localhost".to_string())
}

/// Builder for NodeConfig
#[derive(Debug, Default)]
pub struct NodeConfigBuilder {
    service_port: Option<u16>,
    discovery_port: Option<u16>,
    bind_ip: Option<IpAddr>,
    broadcast_ip: Option<Ipv4Addr>,
    data_dir: Option<PathBuf>,
    host_label: Option<String>,
    discovery_interval_secs: Option<u64>,
    sync_interval_secs: Option<u64>,
    peer_ttl_secs: Option<u64>,
    fetch_timeout_ms: Option<u64>,
    probe_timeout_ms: Option<u64>,
    enable_request_logging: Option<bool>,
    enable_discovery: Option<bool>,
}

impl NodeConfigBuilder {
    /// Set the sync service port
    pub fn service_port(mut self, port: u16) -> Self {
        self.service_port = Some(port);
        self
    }

    /// Set the discovery port
    pub fn discovery_port(mut self, port: u16) -> Self {
        self.discovery_port = Some(port);
        self
    }

    /// Set the bind address
    pub fn bind_ip(mut self, ip: IpAddr) -> Self {
        self.bind_ip = Some(ip);
        self
    }

    /// Set the broadcast destination
    pub fn broadcast_ip(mut self, ip: Ipv4Addr) -> Self {
        self.broadcast_ip = Some(ip);
        self
    }

    /// Set the data directory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Set the advertised host label
    pub fn host_label(mut self, label: impl Into<String>) -> Self {
        self.host_label = Some(label.into());
        self
    }

    pub fn discovery_interval_secs(mut self, secs: u64) -> Self {
        self.discovery_interval_secs = Some(secs);
        self
    }

    pub fn sync_interval_secs(mut self, secs: u64) -> Self {
        self.sync_interval_secs = Some(secs);
        self
    }

    pub fn peer_ttl_secs(mut self, secs: u64) -> Self {
        self.peer_ttl_secs = Some(secs);
        self
    }

    pub fn fetch_timeout_ms(mut self, ms: u64) -> Self {
        self.fetch_timeout_ms = Some(ms);
        self
    }

    pub fn probe_timeout_ms(mut self, ms: u64) -> Self {
        self.probe_timeout_ms = Some(ms);
        self
    }

    /// Enable/disable request logging
    pub fn enable_request_logging(mut self, enable: bool) -> Self {
        self.enable_request_logging = Some(enable);
        self
    }

    /// Enable/disable the hello broadcaster and listener
    pub fn enable_discovery(mut self, enable: bool) -> Self {
        self.enable_discovery = Some(enable);
        self
    }

    /// Build the config
    pub fn build(self) -> Result<NodeConfig> {
        let defaults = NodeConfig::default();
        let config = NodeConfig {
            service_port: self.service_port.unwrap_or(defaults.service_port),
            discovery_port: self.discovery_port.unwrap_or(defaults.discovery_port),
            bind_ip: self.bind_ip.unwrap_or(defaults.bind_ip),
            broadcast_ip: self.broadcast_ip.unwrap_or(defaults.broadcast_ip),
            data_dir: self.data_dir.unwrap_or(defaults.data_dir),
            host_label: self.host_label.unwrap_or(defaults.host_label),
            discovery_interval_secs: self
                .discovery_interval_secs
                .unwrap_or(defaults.discovery_interval_secs),
            sync_interval_secs: self.sync_interval_secs.unwrap_or(defaults.sync_interval_secs),
            peer_ttl_secs: self.peer_ttl_secs.unwrap_or(defaults.peer_ttl_secs),
            fetch_timeout_ms: self.fetch_timeout_ms.unwrap_or(defaults.fetch_timeout_ms),
            probe_timeout_ms: self.probe_timeout_ms.unwrap_or(defaults.probe_timeout_ms),
            enable_request_logging: self
                .enable_request_logging
                .unwrap_or(defaults.enable_request_logging),
            enable_discovery: self.enable_discovery.unwrap_or(defaults.enable_discovery),
        };

        config.validate()?;
        Ok(config)
    }
}
