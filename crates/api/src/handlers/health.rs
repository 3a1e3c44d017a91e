//! `GET /api/health` — per spec §4.11.

use axum::Json;
use axum::extract::State;
use std::sync::Arc;

use studyforge_domain::{AnalyticsSnapshot, HealthResponse, Item, ItemStatus};

use crate::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let published_item_count = state
        .item_bank
        .iter()
        .filter(|item: &&Item| item.status == ItemStatus::Published && item.rubric_score >= Item::MIN_PUBLISHED_RUBRIC_SCORE)
        .count() as u64;

    let (analytics_present, analytics_generated_at) =
        match tokio::fs::read(&state.config.analytics_out_path).await {
            Ok(bytes) => match serde_json::from_slice::<AnalyticsSnapshot>(&bytes) {
                Ok(snapshot) => (true, Some(snapshot.generated_at)),
                Err(_) => (false, None),
            },
            Err(_) => (false, None),
        };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.engine.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        blueprint_loaded: !state.blueprint.weights.is_empty(),
        published_item_count,
        analytics_present,
        analytics_generated_at,
    })
}
