//! Durable, ordered collection of posts kept in a single JSON file

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{IncomingPost, Post};

use super::json_file::{read_json, write_json_atomic};
use super::DataLock;

/// The post store file and the lock guarding it
#[derive(Debug, Clone)]
pub struct PostStore {
    path: PathBuf,
    host_label: String,
    lock: DataLock,
}

impl PostStore {
    /// Create a store over `path`, sharing `lock` with every other data file
    pub fn new(path: impl Into<PathBuf>, host_label: impl Into<String>, lock: DataLock) -> Self {
        Self {
            path: path.into(),
            host_label: host_label.into(),
            lock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Label stamped on records lacking an origin
    pub fn host_label(&self) -> &str {
        &self.host_label
    }

    /// Create the file holding an empty collection if it does not exist
    pub async fn init(&self) -> Result<()> {
        let _guard = self.lock.acquire().await;
        self.load_unlocked().await.map(|_| ())
    }

    /// Current collection, in stored order
    pub async fn load(&self) -> Result<Vec<Post>> {
        let _guard = self.lock.acquire().await;
        self.load_unlocked().await
    }

    /// Replace the whole collection
    pub async fn save(&self, posts: &[Post]) -> Result<()> {
        let _guard = self.lock.acquire().await;
        write_json_atomic(&self.path, &posts).await
    }

    /// Load, transform and save as one critical section
    ///
    /// `f` returns the collection to persist and a value handed back to the caller.
    pub async fn update<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(Vec<Post>) -> (Vec<Post>, R),
    {
        let _guard = self.lock.acquire().await;
        let posts = self.load_unlocked().await?;
        let (posts, out) = f(posts);
        write_json_atomic(&self.path, &posts).await?;
        Ok(out)
    }

    async fn load_unlocked(&self) -> Result<Vec<Post>> {
        match read_json::<Vec<IncomingPost>>(&self.path).await? {
            Some(raw) => {
                let now = chrono::Local::now();
                Ok(raw
                    .into_iter()
                    .map(|p| p.normalize(&self.host_label, now))
                    .collect())
            }
            None => {
                if let Some(parent) = self.path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                write_json_atomic(&self.path, &Vec::<Post>::new()).await?;
                tracing::debug!(path = %self.path.display(), "Initialized empty post store");
                Ok(Vec::new())
            }
        }
    }
}
