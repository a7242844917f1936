//! HTTP handlers of the sync service
//!
//! | Route | Response |
//! |---|---|
//! | `GET /status` | `{"ok":true,"host":..,"port":..}` |
//! | `GET /posts` | the whole post store |
//! | `GET /peers` | live peers |
//! | `POST /merge` | `{"ok":true,"total_posts":..}` or 400 |
//!
//! Anything else answers 404 `{"ok":false,"error":"not_found"}`.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::merge::parse_batch;

use super::server::AppState;

// ============================================================================
// API Response Types
// ============================================================================

/// Identity and liveness of a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub ok: bool,
    pub host: String,
    pub port: u16,
}

/// Result of a merge request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResponse {
    pub ok: bool,
    pub total_posts: usize,
}

/// Error body shared by every failing route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: message.into(),
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

fn internal_error(err: Error) -> Response {
    tracing::error!(error = %err, category = err.category().as_str(), "Request failed");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status).fallback(not_found))
        .route("/posts", get(list_posts).fallback(not_found))
        .route("/peers", get(list_peers).fallback(not_found))
        .route("/merge", post(merge).fallback(not_found))
        .fallback(not_found)
        // Posts carry inline image attachments; batches are not size-bounded
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "not_found")
}

/// Identity probe
async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatusResponse {
        ok: true,
        host: state.host_label.clone(),
        port: state.port,
    })
}

/// Full current store
async fn list_posts(State(state): State<AppState>) -> Response {
    match state.storage.posts.load().await {
        Ok(posts) => Json(posts).into_response(),
        Err(e) => internal_error(e),
    }
}

/// Live peer registry
async fn list_peers(State(state): State<AppState>) -> Response {
    match state.storage.peers.live().await {
        Ok(peers) => Json(peers).into_response(),
        Err(e) => internal_error(e),
    }
}

/// Merge a batch of posts into the store
async fn merge(State(state): State<AppState>, body: Bytes) -> Response {
    let batch = match serde_json::from_slice::<Value>(&body)
        .map_err(|e| Error::InvalidPayload(e.to_string()))
        .and_then(parse_batch)
    {
        Ok(batch) => batch,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected merge request");
            let message = match e {
                Error::InvalidPayload(message) => message,
                other => other.to_string(),
            };
            return error_response(StatusCode::BAD_REQUEST, message);
        }
    };

    match state.merge.apply(batch).await {
        Ok(total_posts) => Json(MergeResponse {
            ok: true,
            total_posts,
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

// ============================================================================
// Tests
// ============================================================================
