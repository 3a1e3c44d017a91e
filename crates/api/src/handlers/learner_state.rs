//! `GET`/`PATCH /api/learner-state` — per spec §4.11.

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use studyforge_domain::{DomainError, LearnerState};

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LearnerStateQuery {
    #[serde(rename = "learnerId")]
    pub learner_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LearnerStateResponse {
    #[serde(rename = "learnerState")]
    pub learner_state: LearnerState,
}

pub async fn get_learner_state(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LearnerStateQuery>,
) -> Result<Json<LearnerStateResponse>, DomainError> {
    let learner_id = query
        .learner_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| DomainError::Validation("learnerId is required".to_string()))?;

    let learner_state = state
        .store
        .load(&learner_id)
        .await
        .map_err(|err| DomainError::Storage(err.to_string()))?;

    Ok(Json(LearnerStateResponse { learner_state }))
}

#[derive(Debug, Deserialize)]
pub struct PatchLearnerStateRequest {
    #[serde(rename = "learnerId")]
    pub learner_id: String,
    #[serde(rename = "learnerState")]
    pub learner_state: LearnerState,
}

pub async fn patch_learner_state(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PatchLearnerStateRequest>,
) -> Result<Json<LearnerStateResponse>, DomainError> {
    if body.learner_state.learner_id != body.learner_id {
        return Err(DomainError::SchemaMismatch(format!(
            "learnerState.learnerId {} does not match learnerId {}",
            body.learner_state.learner_id, body.learner_id
        )));
    }

    let sanitized = body.learner_state.sanitize(&body.learner_id);
    let saved = state
        .store
        .save(&body.learner_id, sanitized)
        .await
        .map_err(|err| DomainError::Storage(err.to_string()))?;

    Ok(Json(LearnerStateResponse { learner_state: saved }))
}
