//! Runs the analyzer job once: reads the attempt event log and writes the
//! analytics snapshot to `ANALYTICS_OUT_PATH`.

use std::path::{Path, PathBuf};

use chrono::Utc;
use studyforge_analyzer::build_snapshot;
use studyforge_config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let config = AppConfig::from_env()?;
    let events_path = PathBuf::from(&config.study_state_dir).join("events.ndjson");
    let now = Utc::now();

    let snapshot = build_snapshot(&events_path, now.to_rfc3339(), now.timestamp_millis()).await?;

    let out_path = Path::new(&config.analytics_out_path);
    if let Some(parent) = out_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_vec_pretty(&snapshot)?;
    tokio::fs::write(out_path, json).await?;

    tracing::info!(
        path = %config.analytics_out_path,
        has_events = snapshot.has_events,
        attempts = snapshot.totals.attempts,
        "wrote analytics snapshot"
    );

    Ok(())
}
