//! Unified error handling for the vnforum crate
//!
//! All fallible operations in the library return [`Result`], whose error type
//! wraps the I/O, serialization and HTTP failures a node can run into.
//!
//! # Usage
//!
//! ```rust,ignore
//! use vnforum::error::{Error, ErrorCategory};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         tracing::debug!("skipping peer: {}", err);
//!     } else {
//!         tracing::error!("fatal: {}", err);
//!     }
//! }
//! ```

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Peer communication (timeout, refused connection, bad status)
    Network,
    /// On-disk store or peer registry
    Storage,
    /// Malformed records or request bodies
    Payload,
    /// Configuration and validation errors
    Config,
}

impl ErrorCategory {
    /// Short label used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Storage => "storage",
            Self::Payload => "payload",
            Self::Config => "config",
        }
    }
}

/// Unified error type for the vnforum crate
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A data file exists but does not hold the expected JSON document
    #[error("Corrupt data file {path}: {source}")]
    CorruptFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A peer answered with a non-success status
    #[error("Peer {peer} answered with status {status}")]
    PeerStatus { peer: String, status: u16 },

    /// Request body or record that cannot be accepted
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Failed to bind a listening socket
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Http(_) | Self::PeerStatus { .. } | Self::Bind { .. } => ErrorCategory::Network,
            Self::Io(_) | Self::CorruptFile { .. } => ErrorCategory::Storage,
            Self::Json(_) | Self::InvalidPayload(_) => ErrorCategory::Payload,
            Self::Config(_) => ErrorCategory::Config,
        }
    }

    /// Whether the operation can be skipped and tried again on a later round
    ///
    /// Storage failures are not recoverable: they terminate the task that hit them.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Network | ErrorCategory::Payload)
    }
}

/// Result type alias using the unified Error
pub type Result<T> = std::result::Result<T, Error>;
