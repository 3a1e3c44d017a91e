//! Subscribes to `ANSWER_SUBMITTED`: loads learner state, runs the engine
//! update, persists it, appends an NDJSON snapshot, and emits
//! `STATE_UPDATED`.

use crate::event_bus::{EventBus, Subscription};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use studyforge_domain::{Difficulty, LearnerState, StateUpdated};
use studyforge_engine::PersonalizationEngine;
use studyforge_storage::{EventLog, LearnerStore};
use tracing::{error, info};

pub const ANSWER_SUBMITTED: &str = "ANSWER_SUBMITTED";
pub const STATE_UPDATED: &str = "STATE_UPDATED";

/// Inbound payload shape; extra fields on the wire are ignored rather than
/// rejected, per spec §4.8.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSubmittedPayload {
    pub learner_id: String,
    pub item_id: String,
    pub lo_ids: Vec<String>,
    pub difficulty: Difficulty,
    pub correct: bool,
    pub ts: i64,
}

pub struct StateService {
    store: Arc<dyn LearnerStore>,
    engine: PersonalizationEngine,
    snapshot_log_dir: std::path::PathBuf,
}

impl StateService {
    pub fn new(store: Arc<dyn LearnerStore>, engine: PersonalizationEngine, snapshot_log_dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            store,
            engine,
            snapshot_log_dir: snapshot_log_dir.into(),
        }
    }

    fn snapshot_log(&self, learner_id: &str) -> EventLog {
        let filename = format!("{}.snapshots.ndjson", studyforge_storage::sanitize_filename(learner_id));
        EventLog::new(self.snapshot_log_dir.join(filename))
    }

    async fn handle(&self, bus: &EventBus, payload: AnswerSubmittedPayload) {
        let state = match self.store.load(&payload.learner_id).await {
            Ok(state) => state,
            Err(err) => {
                error!(error = %err, learner_id = %payload.learner_id, "failed to load learner state");
                return;
            }
        };

        let (next_state, _signals) = self.engine.update(
            state,
            &payload.lo_ids,
            &payload.item_id,
            payload.difficulty,
            payload.correct,
            payload.ts,
        );

        let saved = match self.store.save(&payload.learner_id, next_state).await {
            Ok(saved) => saved,
            Err(err) => {
                error!(error = %err, learner_id = %payload.learner_id, "failed to save learner state");
                return;
            }
        };

        if let Err(err) = self.snapshot_log(&payload.learner_id).append(&saved).await {
            error!(error = %err, learner_id = %payload.learner_id, "failed to append state snapshot");
        }

        info!(learner_id = %payload.learner_id, item_id = %payload.item_id, "learner state updated");

        bus.emit(
            STATE_UPDATED,
            StateUpdated {
                learner_id: payload.learner_id,
                state: saved,
                reason: "attempt".to_string(),
                ts: Utc::now().timestamp_millis(),
            },
        )
        .await;
    }
}

/// Wire a [`StateService`] onto `bus`, returning the subscription so the
/// caller can unsubscribe on shutdown.
pub async fn subscribe(bus: &EventBus, service: Arc<StateService>) -> Subscription {
    let bus_clone = bus.clone();
    bus.on(ANSWER_SUBMITTED, move |value| {
        let service = service.clone();
        let bus_clone = bus_clone.clone();
        async move {
            match serde_json::from_value::<AnswerSubmittedPayload>(value) {
                Ok(payload) => service.handle(&bus_clone, payload).await,
                Err(err) => error!(error = %err, "malformed ANSWER_SUBMITTED payload"),
            }
        }
    })
    .await
}
