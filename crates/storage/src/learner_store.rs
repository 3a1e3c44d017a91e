//! Per-learner state persistence: a `LearnerStore` trait with a JSON-file
//! default implementation, guarded by a per-learner lock table for
//! linearizable read-modify-write.

use crate::error::StorageError;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use studyforge_domain::{LearnerItemState, LearnerLoState, LearnerState};
use tokio::fs;
use tokio::sync::Mutex;

/// Threshold past which the lock table is swept for idle entries.
const PRUNE_THRESHOLD: usize = 256;

/// Persistence contract for learner documents, per spec §4.7. A `load` for
/// an unseen learner never fails — it returns a default-initialized state.
#[async_trait]
pub trait LearnerStore: Send + Sync {
    async fn load(&self, learner_id: &str) -> Result<LearnerState, StorageError>;
    async fn save(&self, learner_id: &str, state: LearnerState) -> Result<LearnerState, StorageError>;

    async fn update_learner_lo_state(
        &self,
        learner_id: &str,
        lo_id: &str,
        updater: Box<dyn for<'a> FnOnce(&'a mut LearnerLoState) + Send>,
    ) -> Result<LearnerState, StorageError>;

    async fn record_item_exposure(
        &self,
        learner_id: &str,
        item_id: &str,
        correct: bool,
        ts: i64,
    ) -> Result<LearnerState, StorageError>;
}

/// Sanitize a learner id into a safe filename stem: anything outside
/// `[a-zA-Z0-9-_]` becomes `_`, per spec §4.7.
pub fn sanitize_filename(learner_id: &str) -> String {
    learner_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// JSON-document-per-learner store under a base directory, with
/// write-then-rename atomicity and per-learner mutual exclusion.
pub struct JsonFileLearnerStore {
    base_dir: PathBuf,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl JsonFileLearnerStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            locks: DashMap::new(),
        }
    }

    fn path_for(&self, learner_id: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", sanitize_filename(learner_id)))
    }

    /// Acquire (creating if absent) the per-learner lock, pruning idle
    /// entries once the table grows past [`PRUNE_THRESHOLD`].
    fn lock_for(&self, learner_id: &str) -> Arc<Mutex<()>> {
        let lock = self
            .locks
            .entry(learner_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        if self.locks.len() > PRUNE_THRESHOLD {
            self.locks.retain(|_, v| Arc::strong_count(v) > 1);
        }

        lock
    }

    async fn read_raw(&self, learner_id: &str) -> Result<LearnerState, StorageError> {
        let path = self.path_for(learner_id);
        match fs::read(&path).await {
            Ok(bytes) => {
                let parsed: LearnerState =
                    serde_json::from_slice(&bytes).map_err(|source| StorageError::Malformed {
                        learner_id: learner_id.to_string(),
                        source,
                    })?;
                Ok(parsed.sanitize(learner_id))
            }
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Ok(LearnerState::new(learner_id, Utc::now().to_rfc3339()))
            }
            Err(source) => Err(StorageError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    async fn write_raw(&self, learner_id: &str, state: &LearnerState) -> Result<(), StorageError> {
        let path = self.path_for(learner_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|source| StorageError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let payload = serde_json::to_vec_pretty(state).expect("LearnerState always serializes");
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, &payload).await.map_err(|source| StorageError::Io {
            path: tmp_path.display().to_string(),
            source,
        })?;
        fs::rename(&tmp_path, &path).await.map_err(|source| StorageError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Ok(())
    }
}

#[async_trait]
impl LearnerStore for JsonFileLearnerStore {
    async fn load(&self, learner_id: &str) -> Result<LearnerState, StorageError> {
        let lock = self.lock_for(learner_id);
        let _guard = lock.lock().await;
        self.read_raw(learner_id).await
    }

    async fn save(&self, learner_id: &str, mut state: LearnerState) -> Result<LearnerState, StorageError> {
        let lock = self.lock_for(learner_id);
        let _guard = lock.lock().await;
        state = state.sanitize(learner_id);
        state.updated_at = Utc::now().to_rfc3339();
        self.write_raw(learner_id, &state).await?;
        Ok(state)
    }

    async fn update_learner_lo_state(
        &self,
        learner_id: &str,
        lo_id: &str,
        updater: Box<dyn for<'a> FnOnce(&'a mut LearnerLoState) + Send>,
    ) -> Result<LearnerState, StorageError> {
        let lock = self.lock_for(learner_id);
        let _guard = lock.lock().await;
        let mut state = self.read_raw(learner_id).await?;
        let lo = state.los.entry(lo_id.to_string()).or_default();
        updater(lo);
        state.updated_at = Utc::now().to_rfc3339();
        self.write_raw(learner_id, &state).await?;
        Ok(state)
    }

    async fn record_item_exposure(
        &self,
        learner_id: &str,
        item_id: &str,
        correct: bool,
        ts: i64,
    ) -> Result<LearnerState, StorageError> {
        let lock = self.lock_for(learner_id);
        let _guard = lock.lock().await;
        let mut state = self.read_raw(learner_id).await?;
        let item = state.items.entry(item_id.to_string()).or_insert_with(LearnerItemState::default);
        item.record(correct, ts);
        state.updated_at = Utc::now().to_rfc3339();
        self.write_raw(learner_id, &state).await?;
        Ok(state)
    }
}

/// Root directory the store persists under, exposed for diagnostics (e.g.
/// `/api/health`'s asset-presence checks).
pub fn store_root(store: &JsonFileLearnerStore) -> &Path {
    &store.base_dir
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sanitize_filename_replaces_unsafe_characters() {
        assert_eq!(sanitize_filename("learner/../1"), "learner___1");
        assert_eq!(sanitize_filename("learner-1_ok"), "learner-1_ok");
    }

    #[tokio::test]
    async fn load_of_unseen_learner_returns_default_state() {
        let dir = tempdir().unwrap();
        let store = JsonFileLearnerStore::new(dir.path());
        let state = store.load("new-learner").await.unwrap();
        assert_eq!(state.learner_id, "new-learner");
        assert!(state.los.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = JsonFileLearnerStore::new(dir.path());
        let mut state = store.load("learner-1").await.unwrap();
        state.los.insert("lo1".to_string(), LearnerLoState::default());
        let saved = store.save("learner-1", state).await.unwrap();

        let reloaded = store.load("learner-1").await.unwrap();
        assert_eq!(reloaded.los.len(), saved.los.len());
        assert!(reloaded.los.contains_key("lo1"));
    }

    #[tokio::test]
    async fn save_overwrites_mismatched_learner_id() {
        let dir = tempdir().unwrap();
        let store = JsonFileLearnerStore::new(dir.path());
        let state = LearnerState::new("wrong-id", "2026-01-01T00:00:00Z");
        let saved = store.save("correct-id", state).await.unwrap();
        assert_eq!(saved.learner_id, "correct-id");
    }

    #[tokio::test]
    async fn update_learner_lo_state_is_atomic_read_modify_write() {
        let dir = tempdir().unwrap();
        let store = JsonFileLearnerStore::new(dir.path());
        let state = store
            .update_learner_lo_state(
                "learner-1",
                "lo1",
                Box::new(|lo| {
                    lo.theta_hat = 1.5;
                }),
            )
            .await
            .unwrap();
        assert_eq!(state.los["lo1"].theta_hat, 1.5);
    }

    #[tokio::test]
    async fn record_item_exposure_accumulates_attempts() {
        let dir = tempdir().unwrap();
        let store = JsonFileLearnerStore::new(dir.path());
        store.record_item_exposure("learner-1", "item-1", true, 1000).await.unwrap();
        let state = store.record_item_exposure("learner-1", "item-1", false, 2000).await.unwrap();
        let item = &state.items["item-1"];
        assert_eq!(item.attempts, 2);
        assert_eq!(item.correct, 1);
    }
}
