//! Whole-document JSON files replaced atomically
//!
//! Every write goes to a sibling `.tmp` file which is then renamed over the
//! target, so a reader sees either the old or the new document, never a
//! partially written one.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Path of the temporary file used while replacing `path`
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Read and decode a JSON document, `None` if the file does not exist
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let value = serde_json::from_slice(&bytes).map_err(|source| Error::CorruptFile {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Some(value))
}

/// Encode `value` as indented JSON and atomically replace `path` with it
pub async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let temp = temp_path(path);

    tokio::fs::write(&temp, &bytes).await?;
    tokio::fs::rename(&temp, path).await?;

    tracing::trace!(path = %path.display(), bytes = bytes.len(), "Data file replaced");
    Ok(())
}
