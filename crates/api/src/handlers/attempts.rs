//! `POST /api/attempts` — per spec §4.9.

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use std::sync::Arc;

use studyforge_bus::{AnswerSubmittedPayload, ANSWER_SUBMITTED};
use studyforge_domain::{AttemptEvent, DomainError, Difficulty};
use studyforge_storage::EventLog;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct IngestAck {
    pub status: &'static str,
}

pub async fn ingest_attempt(
    State(state): State<Arc<AppState>>,
    Json(event): Json<AttemptEvent>,
) -> Result<Json<IngestAck>, DomainError> {
    if event.schema_version != state.config.schema_version {
        return Err(DomainError::Validation(format!(
            "schema_version {} does not match declared {}",
            event.schema_version, state.config.schema_version
        )));
    }

    let errors = event.validate();
    if !errors.is_empty() {
        return Err(DomainError::SchemaMismatch(errors.join("; ")));
    }

    if state.config.write_telemetry {
        let log = EventLog::new(state.events_log_path());
        log.append(&event)
            .await
            .map_err(|err| DomainError::Storage(err.to_string()))?;
    }

    // TODO: a failed mirror write is only logged, never retried. A
    // reconciliation job reading a dead-letter file of failed attempts
    // would let the mirror catch up after an outage.
    if let Err(err) = state.mirror.mirror_attempt(&event).await {
        tracing::error!(error = %err, "external mirror rejected attempt row");
    }

    state
        .wiring
        .bus
        .emit(
            ANSWER_SUBMITTED,
            AnswerSubmittedPayload {
                learner_id: event.user_id.clone(),
                item_id: event.item_id.clone(),
                lo_ids: event.lo_ids.clone(),
                difficulty: event.difficulty.unwrap_or(Difficulty::Medium),
                correct: event.correct,
                ts: event.ts_submit,
            },
        )
        .await;

    Ok(Json(IngestAck { status: "ok" }))
}
