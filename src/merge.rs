//! Union-by-id merge of post collections
//!
//! [`merge_posts`] is the pure rule: key every record by `id`, let an incoming
//! record replace a local one with the same `id` wholesale, then order the
//! result by `created_ts`, newest first. Ties keep first-seen order: local
//! records in stored order, then incoming records that introduced new ids.
//!
//! A colliding id is resolved by overwrite, not by comparing timestamps.
//! Posts are never edited after creation, so the overwrite normally replaces
//! a record with identical content.
//!
//! [`MergeEngine`] runs the rule against the post store as a single critical
//! section.

use std::collections::HashMap;

use chrono::{DateTime, Local};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{IncomingPost, Post};
use crate::storage::PostStore;

/// Combine `local` and `incoming` into one deduplicated, time-ordered collection
pub fn merge_posts(local: Vec<Post>, incoming: Vec<Post>) -> Vec<Post> {
    let mut merged: Vec<Post> = Vec::with_capacity(local.len() + incoming.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(merged.capacity());

    for post in local.into_iter().chain(incoming) {
        match index.get(&post.id) {
            Some(&slot) => merged[slot] = post,
            None => {
                index.insert(post.id.clone(), merged.len());
                merged.push(post);
            }
        }
    }

    // Stable: equal timestamps keep insertion order
    merged.sort_by(|a, b| b.created_ts.cmp(&a.created_ts));
    merged
}

/// Normalize a batch of wire records against this host
pub fn normalize_all(incoming: Vec<IncomingPost>, host_label: &str, now: DateTime<Local>) -> Vec<Post> {
    incoming
        .into_iter()
        .map(|p| p.normalize(host_label, now))
        .collect()
}

/// Validate a decoded request body as a batch of posts
///
/// Anything but a JSON array, or an array holding something other than post
/// objects, is rejected.
pub fn parse_batch(body: Value) -> Result<Vec<IncomingPost>> {
    if !body.is_array() {
        return Err(Error::InvalidPayload("payload must be list".to_string()));
    }
    serde_json::from_value(body).map_err(|e| Error::InvalidPayload(e.to_string()))
}

/// Applies incoming batches to the post store
#[derive(Debug, Clone)]
pub struct MergeEngine {
    store: PostStore,
}

impl MergeEngine {
    pub fn new(store: PostStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &PostStore {
        &self.store
    }

    /// Merge `incoming` into the store and return the new total post count
    pub async fn apply(&self, incoming: Vec<IncomingPost>) -> Result<usize> {
        let received = incoming.len();
        let incoming = normalize_all(incoming, self.store.host_label(), Local::now());

        let total = self
            .store
            .update(move |local| {
                let merged = merge_posts(local, incoming);
                let total = merged.len();
                (merged, total)
            })
            .await?;

        tracing::debug!(received, total_posts = total, "Merged posts");
        Ok(total)
    }
}
