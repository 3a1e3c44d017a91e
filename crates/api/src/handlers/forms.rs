//! `POST /api/forms/build` — per spec §4.4/§4.11.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use studyforge_domain::{DomainError, ExamForm, ItemStatus};
use studyforge_engine::blueprint::{build_form_greedy, BuildFormInput};

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BuildFormRequest {
    pub length: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default, rename = "publishedOnly")]
    pub published_only: bool,
}

#[derive(Debug, Serialize)]
pub struct BuildFormResponse {
    pub form: ExamForm,
}

pub async fn build_form(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BuildFormRequest>,
) -> Result<Json<BuildFormResponse>, DomainError> {
    if request.length == 0 {
        return Err(DomainError::Validation("length must be positive".to_string()));
    }

    let candidate_items: Vec<_> = if request.published_only {
        state
            .item_bank
            .iter()
            .filter(|item| item.status == ItemStatus::Published)
            .cloned()
            .collect()
    } else {
        state.item_bank.clone()
    };

    let item_ids = build_form_greedy(BuildFormInput {
        blueprint: &state.blueprint,
        items: &candidate_items,
        form_length: request.length,
        seed: request.seed.unwrap_or(u64::from(state.engine.seed)),
    })
    .map_err(|deficit| DomainError::Infeasible {
        blueprint_id: deficit.blueprint_id,
        deficits: deficit
            .deficits
            .into_iter()
            .map(|d| format!("{}: need {}, have {}", d.lo_id, d.needed, d.have))
            .collect(),
    })?;

    Ok(Json(BuildFormResponse {
        form: ExamForm {
            blueprint_id: state.blueprint.id.clone(),
            length: item_ids.len(),
            item_ids,
        },
    }))
}
