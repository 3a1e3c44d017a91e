//! `POST /api/sessions` — per spec §4.9.

use axum::Json;
use axum::extract::State;
use std::sync::Arc;

use studyforge_domain::{DomainError, SessionEvent};
use studyforge_storage::EventLog;

use crate::AppState;
use crate::handlers::attempts::IngestAck;

pub async fn ingest_session(
    State(state): State<Arc<AppState>>,
    Json(event): Json<SessionEvent>,
) -> Result<Json<IngestAck>, DomainError> {
    if event.schema_version != state.config.schema_version {
        return Err(DomainError::Validation(format!(
            "schema_version {} does not match declared {}",
            event.schema_version, state.config.schema_version
        )));
    }

    if event.end_ts.is_some_and(|end| end < event.start_ts) {
        return Err(DomainError::SchemaMismatch(
            "end_ts must be >= start_ts".to_string(),
        ));
    }

    if state.config.write_telemetry {
        let log = EventLog::new(state.events_log_path());
        log.append(&event)
            .await
            .map_err(|err| DomainError::Storage(err.to_string()))?;
    }

    if let Err(err) = state.mirror.mirror_session(&event).await {
        tracing::error!(error = %err, "external mirror rejected session row");
    }

    Ok(Json(IngestAck { status: "ok" }))
}
