//! studyforge HTTP surface: the axum router wiring ingest, learner-state,
//! form-building, search, and health endpoints onto the engine, storage,
//! and bus crates.

pub mod handlers;
pub mod ingest;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::error_handling::HandleErrorLayer;
use axum::middleware;
use axum::routing::{get, post};
use axum::{BoxError, Router};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use studyforge_bus::Wiring;
use studyforge_config::AppConfig;
use studyforge_domain::{Blueprint, DomainError, EvidenceChunk, Item, LearningObjective};
use studyforge_engine::PersonalizationEngine;
use studyforge_storage::{ExternalMirror, LearnerStore};

use handlers::attempts::ingest_attempt;
use handlers::forms::build_form;
use handlers::health::health;
use handlers::learner_state::{get_learner_state, patch_learner_state};
use handlers::search::search_evidence;
use handlers::sessions::ingest_session;
use ingest::{ingest_guard, RateLimiter};

/// Application state shared across handlers. The content tables
/// (`item_bank`, `blueprint`, `learning_objectives`, `evidence_chunks`) are
/// process-wide read-only data, loaded once at startup per spec §5.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn LearnerStore>,
    pub engine: PersonalizationEngine,
    pub wiring: Wiring,
    pub mirror: Arc<dyn ExternalMirror>,
    pub item_bank: Vec<Item>,
    pub blueprint: Blueprint,
    pub learning_objectives: Vec<LearningObjective>,
    pub evidence_chunks: Vec<EvidenceChunk>,
    pub rate_limiter: RateLimiter,
    pub start_time: Instant,
}

impl AppState {
    pub fn events_log_path(&self) -> PathBuf {
        PathBuf::from(&self.config.study_state_dir).join("events.ndjson")
    }
}

/// Maps a boxed service error — in practice a [`tower::timeout::error::Elapsed`]
/// from the deadline layer below — onto the domain error taxonomy's 504, per
/// spec §5's request-scoped deadline.
async fn handle_timeout_error(err: BoxError) -> DomainError {
    if err.is::<tower::timeout::error::Elapsed>() {
        DomainError::Timeout
    } else {
        DomainError::Internal(anyhow::anyhow!(err))
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let timeout_ms = state.config.request_timeout_ms;

    let ingest_routes = Router::new()
        .route("/api/attempts", post(ingest_attempt))
        .route("/api/sessions", post(ingest_session))
        .route_layer(middleware::from_fn_with_state(state.clone(), ingest_guard));

    Router::new()
        .merge(ingest_routes)
        .route("/api/learner-state", get(get_learner_state).patch(patch_learner_state))
        .route("/api/forms/build", post(build_form))
        .route("/api/search", get(search_evidence))
        .route("/api/health", get(health))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .timeout(Duration::from_millis(timeout_ms)),
        )
        .with_state(state)
}
