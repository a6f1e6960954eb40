//! # Snapshot Store
//!
//! Durable copy of the decoded rows, one JSON file:
//!
//! ```json
//! {"data": [{"entity": "Japan", "year": 2000, "wEst": 1.0, "eEst": null, ...}], "timestamp": 1700000000000}
//! ```
//!
//! Writes go to a temporary file in the same directory which is then renamed
//! over the target, so readers see either the old snapshot or the new one.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::StoreError;
use crate::model::Row;

/// # Persisted Snapshot
///
/// The on-disk record. `source` is absent in files written before it was
/// tracked; such files are accepted for any source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    /// Decoded rows, in file order.
    pub data: Vec<Row>,
    /// Fetch time, ms since epoch.
    pub timestamp: i64,
    /// URL the rows were fetched from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl PersistedSnapshot {
    /// True when this snapshot may stand in for `source`.
    pub fn matches(&self, source: &str) -> bool {
        self.source.as_deref().map_or(true, |s| s == source)
    }
}

/// File-backed snapshot store.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// A store writing to `path`. Nothing is touched until the first call.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the snapshot. `Ok(None)` when no file exists yet.
    ///
    /// # Errors
    /// `StoreError::IoError` if the file exists but cannot be read,
    /// `StoreError::JsonError` if it is not a snapshot.
    pub async fn load(&self) -> Result<Option<PersistedSnapshot>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::JsonError {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })
    }

    /// Atomically replaces the snapshot, creating parent directories as
    /// needed.
    ///
    /// # Errors
    /// Any serialisation, I/O or rename failure. The previous file, if any,
    /// is left intact.
    pub async fn save(&self, snapshot: &PersistedSnapshot) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(snapshot).map_err(|e| StoreError::JsonError {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
            .await
            .map_err(|e| StoreError::TaskError(e.to_string()))??;

        debug!(path = %self.path.display(), rows = snapshot.data.len(), "Snapshot persisted");
        Ok(())
    }

    /// Deletes the snapshot file. A missing file is not an error.
    ///
    /// # Errors
    /// `StoreError::IoError` if the file exists but cannot be removed.
    pub async fn remove(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn io_error(&self, e: std::io::Error) -> StoreError {
        StoreError::IoError {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        }
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let io_error = |e: std::io::Error| StoreError::IoError {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(io_error)?;

    let mut tmp = NamedTempFile::new_in(&dir).map_err(io_error)?;
    tmp.write_all(bytes).map_err(io_error)?;
    tmp.as_file().sync_all().map_err(io_error)?;
    tmp.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(timestamp: i64) -> PersistedSnapshot {
        let mut row = Row::empty("Japan", Some(2000));
        row.working_age_estimate = Some(86.0);
        row.elderly_estimate = Some(22.0);
        PersistedSnapshot {
            data: vec![row],
            timestamp,
            source: Some("http://upstream/data.csv".to_string()),
        }
    }

    #[tokio::test]
    async fn absent_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("owid-data.json"));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_creates_directories_and_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join(".cache").join("owid-data.json"));

        store.save(&snapshot(1)).await.unwrap();
        store.save(&snapshot(2)).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, snapshot(2));

        let leftovers = std::fs::read_dir(dir.path().join(".cache")).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[tokio::test]
    async fn reads_files_without_source_and_with_null_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("owid-data.json");
        std::fs::write(
            &path,
            r#"{"data":[{"entity":"Chile","year":1990,"wEst":100,"eEst":null,"wMed":null,"eMed":null}],"timestamp":42}"#,
        )
        .unwrap();

        let loaded = SnapshotStore::new(&path).load().await.unwrap().unwrap();
        assert_eq!(loaded.timestamp, 42);
        assert_eq!(loaded.source, None);
        assert!(loaded.matches("anything"));
        assert_eq!(loaded.data[0].working_age_estimate, Some(100.0));
        assert_eq!(loaded.data[0].elderly_estimate, None);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("owid-data.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = SnapshotStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, StoreError::JsonError { .. }));
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("owid-data.json"));

        store.save(&snapshot(1)).await.unwrap();
        store.remove().await.unwrap();
        store.remove().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }
}
