//! Core data structures shared by the store, the merge engine and the wire
//!
//! A [`Post`] carries a handful of typed fields the node relies on and keeps
//! every other key (attachments, reactions, comments added by front-ends) in
//! an opaque map that is written back exactly as it was read.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::net::IpAddr;
use uuid::Uuid;

/// Tag carried by every discovery datagram
pub const HELLO_TYPE: &str = "vnforum_hello";

/// Display format of [`Post::created`]
pub const CREATED_FORMAT: &str = "%d/%m/%Y %H:%M";

// ============================================================================
// Post
// ============================================================================

/// A forum post as persisted in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier, assigned once by the creating client
    pub id: String,

    pub title: String,

    pub body: String,

    pub author: String,

    /// Label of the host the post was created on
    pub origin: String,

    /// Human readable creation time
    pub created: String,

    /// Creation time in epoch seconds; the only ordering key
    pub created_ts: i64,

    /// Fields the node does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Post {
    /// Create a post authored on this host at `now`
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        author: impl Into<String>,
        origin: impl Into<String>,
        now: DateTime<Local>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            body: body.into(),
            author: author.into(),
            origin: origin.into(),
            created: now.format(CREATED_FORMAT).to_string(),
            created_ts: now.timestamp(),
            extra: Map::new(),
        }
    }
}

/// Wire form of a post where every known field may be absent
///
/// Records coming from peers, from `POST /merge` and from the store file
/// itself are read in this form and turned into a [`Post`] by
/// [`IncomingPost::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomingPost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_ts: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IncomingPost {
    /// Fill every missing field and produce a storable post
    ///
    /// A missing `id` gets a fresh UUID, a missing `origin` the local host
    /// label, missing timestamps the time `now`.
    pub fn normalize(self, host_label: &str, now: DateTime<Local>) -> Post {
        Post {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            title: self.title.unwrap_or_default(),
            body: self.body.unwrap_or_default(),
            author: self.author.unwrap_or_else(|| "user".to_string()),
            origin: self.origin.unwrap_or_else(|| host_label.to_string()),
            created: self
                .created
                .unwrap_or_else(|| now.format(CREATED_FORMAT).to_string()),
            created_ts: self.created_ts.unwrap_or_else(|| now.timestamp()),
            extra: self.extra,
        }
    }
}

impl From<Post> for IncomingPost {
    fn from(post: Post) -> Self {
        Self {
            id: Some(post.id),
            title: Some(post.title),
            body: Some(post.body),
            author: Some(post.author),
            origin: Some(post.origin),
            created: Some(post.created),
            created_ts: Some(post.created_ts),
            extra: post.extra,
        }
    }
}

// ============================================================================
// Peer
// ============================================================================

/// Liveness record of a peer, keyed by its observed address in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    /// Advertised sync service port
    pub port: u16,

    /// Advertised host label
    pub host: String,

    /// Epoch seconds of the last hello received
    pub last_seen: i64,
}

impl PeerRecord {
    /// Seconds elapsed between the last hello and `now`
    pub fn age(&self, now: i64) -> i64 {
        now - self.last_seen
    }

    /// Whether the peer is still alive at `now` under `ttl_secs`
    ///
    /// An age exactly equal to the TTL still counts as alive.
    pub fn is_live(&self, now: i64, ttl_secs: i64) -> bool {
        self.age(now) <= ttl_secs
    }

    /// Base URL of the peer's sync service
    ///
    /// IPv6 addresses are bracketed.
    pub fn base_url(&self, address: &str) -> String {
        match address.parse::<IpAddr>() {
            Ok(IpAddr::V6(v6)) => format!("http://[{}]:{}", v6, self.port),
            _ => format!("http://{}:{}", address, self.port),
        }
    }
}

// ============================================================================
// Discovery
// ============================================================================

/// Datagram a node broadcasts to announce its sync service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloMessage {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl HelloMessage {
    /// Hello advertising `port` and `host`
    pub fn new(port: u16, host: impl Into<String>) -> Self {
        Self {
            kind: HELLO_TYPE.to_string(),
            port: Some(port),
            host: Some(host.into()),
        }
    }

    /// Decode a datagram, returning `None` for anything that is not a hello
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let message: Self = serde_json::from_slice(bytes).ok()?;
        (message.kind == HELLO_TYPE).then_some(message)
    }

    /// Encode as the JSON datagram payload
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Current time in epoch seconds
pub fn unix_now() -> i64 {
    Local::now().timestamp()
}

/// Local time for an epoch second, used when normalizing with a fixed clock
pub fn local_time(epoch_secs: i64) -> DateTime<Local> {
    Local
        .timestamp_opt(epoch_secs, 0)
        .single()
        .unwrap_or_else(Local::now)
}
