//! Subscribes to `SAVE_LESSON_REQUESTED`: validates the lesson payload,
//! writes it to lesson storage, and emits `LESSON_CREATED`.
//!
//! Partially integrated per spec §9: `LESSON_CREATED` is emitted but has
//! no consumer in this tree yet (the analyzer does not read lessons).

use crate::event_bus::{EventBus, Subscription};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use studyforge_domain::{Lesson, LessonCreated};
use tokio::fs;
use tracing::{error, info};

pub const SAVE_LESSON_REQUESTED: &str = "SAVE_LESSON_REQUESTED";
pub const LESSON_CREATED: &str = "LESSON_CREATED";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveLessonRequestedPayload {
    pub lesson: Lesson,
    pub request_id: String,
}

pub struct LessonService {
    storage_dir: PathBuf,
}

impl LessonService {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
        }
    }

    fn validate(lesson: &Lesson) -> Vec<String> {
        let mut errors = Vec::new();
        if lesson.id.trim().is_empty() {
            errors.push("lesson id must not be empty".to_string());
        }
        if lesson.title.trim().is_empty() {
            errors.push("lesson title must not be empty".to_string());
        }
        errors
    }

    async fn handle(&self, bus: &EventBus, payload: SaveLessonRequestedPayload) {
        let errors = Self::validate(&payload.lesson);
        if !errors.is_empty() {
            error!(request_id = %payload.request_id, ?errors, "rejected malformed lesson");
            return;
        }

        if let Err(err) = fs::create_dir_all(&self.storage_dir).await {
            error!(error = %err, "failed to create lesson storage directory");
            return;
        }

        let path = self.storage_dir.join(format!("{}.json", payload.lesson.id));
        let body = match serde_json::to_vec_pretty(&payload.lesson) {
            Ok(body) => body,
            Err(err) => {
                error!(error = %err, "failed to serialize lesson");
                return;
            }
        };

        if let Err(err) = fs::write(&path, body).await {
            error!(error = %err, path = %path.display(), "failed to persist lesson");
            return;
        }

        info!(lesson_id = %payload.lesson.id, "lesson saved");

        bus.emit(
            LESSON_CREATED,
            LessonCreated {
                lesson: payload.lesson,
                job_id: payload.request_id,
                ts: Utc::now().timestamp_millis(),
            },
        )
        .await;
    }
}

pub async fn subscribe(bus: &EventBus, service: std::sync::Arc<LessonService>) -> Subscription {
    let bus_clone = bus.clone();
    bus.on(SAVE_LESSON_REQUESTED, move |value| {
        let service = service.clone();
        let bus_clone = bus_clone.clone();
        async move {
            match serde_json::from_value::<SaveLessonRequestedPayload>(value) {
                Ok(payload) => service.handle(&bus_clone, payload).await,
                Err(err) => error!(error = %err, "malformed SAVE_LESSON_REQUESTED payload"),
            }
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn valid_lesson_is_persisted_and_created_event_emitted() {
        let dir = tempdir().unwrap();
        let service = Arc::new(LessonService::new(dir.path()));
        let bus = EventBus::new();
        subscribe(&bus, service).await;

        bus.emit(
            SAVE_LESSON_REQUESTED,
            SaveLessonRequestedPayload {
                lesson: Lesson {
                    id: "lesson-1".to_string(),
                    title: "Photosynthesis".to_string(),
                    body: "...".to_string(),
                    lo_ids: vec!["lo1".to_string()],
                },
                request_id: "req-1".to_string(),
            },
        )
        .await;

        let path = dir.path().join("lesson-1.json");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn empty_title_is_rejected_without_writing() {
        let dir = tempdir().unwrap();
        let service = Arc::new(LessonService::new(dir.path()));
        let bus = EventBus::new();
        subscribe(&bus, service).await;

        bus.emit(
            SAVE_LESSON_REQUESTED,
            SaveLessonRequestedPayload {
                lesson: Lesson {
                    id: "lesson-2".to_string(),
                    title: "".to_string(),
                    body: "...".to_string(),
                    lo_ids: vec![],
                },
                request_id: "req-2".to_string(),
            },
        )
        .await;

        let path = dir.path().join("lesson-2.json");
        assert!(!path.exists());
    }
}
