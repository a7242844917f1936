//! HTTP client for talking to other nodes' sync services
//!
//! Used by the sync engine to pull posts, by the startup guard to probe the
//! local service, and by the CLI.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::IncomingPost;
use crate::storage::PeerMap;

use super::api::{MergeResponse, StatusResponse};

/// Client for another node's sync service
#[derive(Debug, Clone)]
pub struct PeerClient {
    http_client: Client,
    timeout: Duration,
}

impl PeerClient {
    /// Create a client whose every request is bounded by `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `GET /status`
    pub async fn status(&self, base_url: &str) -> Result<StatusResponse> {
        self.get_json(base_url, "/status").await
    }

    /// `GET /posts`
    pub async fn posts(&self, base_url: &str) -> Result<Vec<IncomingPost>> {
        self.get_json(base_url, "/posts").await
    }

    /// `GET /peers`
    pub async fn peers(&self, base_url: &str) -> Result<PeerMap> {
        self.get_json(base_url, "/peers").await
    }

    /// `POST /merge`, returning the peer's new total post count
    ///
    /// Records are sent as given; sparse ones are normalized by the receiver.
    pub async fn push_posts<T: Serialize>(&self, base_url: &str, posts: &[T]) -> Result<usize> {
        let url = format!("{}/merge", base_url.trim_end_matches('/'));
        let response = self.http_client.post(&url).json(posts).send().await?;
        let merged: MergeResponse = decode(base_url, response).await?;
        Ok(merged.total_posts)
    }

    async fn get_json<T: DeserializeOwned>(&self, base_url: &str, path: &str) -> Result<T> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), path);
        let response = self.http_client.get(&url).send().await?;
        decode(base_url, response).await
    }
}

async fn decode<T: DeserializeOwned>(base_url: &str, response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(Error::PeerStatus {
            peer: base_url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.json::<T>().await?)
}
