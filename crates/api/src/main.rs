//! studyforge HTTP server entry point.

use std::sync::Arc;
use std::time::Instant;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studyforge_api::ingest::RateLimiter;
use studyforge_api::{build_router, AppState};
use studyforge_bus::wire_services;
use studyforge_config::AppConfig;
use studyforge_engine::PersonalizationEngine;
use studyforge_storage::{
    load_blueprint, load_evidence_chunks, load_item_bank, load_learning_objectives, ExternalMirror,
    JsonFileLearnerStore, LearnerStore, NoopMirror, SupabaseMirror,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting studyforge server...");

    let config = AppConfig::from_env()?;
    tracing::info!("Binding to {}", config.bind_address);

    let item_bank = load_item_bank(&config.scope_dirs).await?;
    tracing::info!(count = item_bank.len(), "loaded item bank");

    let blueprint = load_blueprint(&config.blueprint_path).await?;
    let learning_objectives = load_learning_objectives(&config.los_path).await?;
    let evidence_chunks = load_evidence_chunks(&config.evidence_path).await?;

    let store: Arc<dyn LearnerStore> = Arc::new(JsonFileLearnerStore::new(&config.study_state_dir));
    let engine = PersonalizationEngine::default();

    let mirror: Arc<dyn ExternalMirror> = if config.use_supabase_ingest {
        let url = config
            .supabase_url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("USE_SUPABASE_INGEST set without SUPABASE_URL"))?;
        let key = config
            .supabase_service_role_key
            .clone()
            .ok_or_else(|| anyhow::anyhow!("USE_SUPABASE_INGEST set without SUPABASE_SERVICE_ROLE_KEY"))?;
        Arc::new(SupabaseMirror::new(url, key))
    } else {
        Arc::new(NoopMirror)
    };

    let snapshot_log_dir = format!("{}/snapshots", config.study_state_dir);
    let lesson_storage_dir = format!("{}/lessons", config.study_state_dir);
    let wiring = wire_services(store.clone(), engine.clone(), snapshot_log_dir, lesson_storage_dir).await;

    let rate_limiter = RateLimiter::new(config.ingest_window_ms, config.ingest_window_max);

    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        engine,
        wiring,
        mirror,
        item_bank,
        blueprint,
        learning_objectives,
        evidence_chunks,
        rate_limiter,
        start_time: Instant::now(),
    });

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!("Server listening on {}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
