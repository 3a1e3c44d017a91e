//! `GET /api/search` — per spec §4.11/§4.12.

use axum::Json;
use axum::extract::{Query, State};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use studyforge_domain::{DomainError, SearchHit};
use studyforge_engine::retrieval::{search, SearchQuery as EngineSearchQuery};

use crate::AppState;

const DEFAULT_K: usize = 5;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub lo: Option<String>,
    #[serde(default)]
    pub since: Option<i64>,
    #[serde(default)]
    pub k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

pub async fn search_evidence(
    State(state): State<Arc<AppState>>,
    Query(request): Query<SearchRequest>,
) -> Result<Json<SearchResponse>, DomainError> {
    let lo_ids: Vec<String> = request
        .lo
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let query = EngineSearchQuery {
        text: &request.q,
        lo_ids: &lo_ids,
        since_ms: request.since,
        k: request.k.unwrap_or(DEFAULT_K),
        now_ms: Utc::now().timestamp_millis(),
    };

    let results = search(&query, &state.evidence_chunks);
    Ok(Json(SearchResponse { results }))
}
