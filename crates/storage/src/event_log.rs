//! NDJSON event log: one JSON object per line, append-only, tolerant of a
//! missing trailing newline or a malformed final line (a torn write).

use crate::error::StorageError;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line. Creates parent directories as
    /// needed; does not fsync (spec §5: "appends are ordered but not
    /// fsync-guaranteed").
    pub async fn append<T: Serialize + Sync>(&self, record: &T) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|source| StorageError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let mut line = serde_json::to_vec(record).expect("event records always serialize");
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| StorageError::Io {
                path: self.path.display().to_string(),
                source,
            })?;

        file.write_all(&line).await.map_err(|source| StorageError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        Ok(())
    }

    /// Read and parse every well-formed line, silently skipping malformed
    /// or partial lines (e.g. a torn final write).
    pub async fn read_all<T: DeserializeOwned>(&self) -> Result<Vec<T>, StorageError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.display().to_string(),
                    source,
                })
            }
        };

        let records = contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str::<T>(line).ok())
            .collect();

        Ok(records)
    }

    pub async fn exists(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }
}
