//! Offline analytics: reads the attempt event log and derives the
//! dashboard snapshot consumed by `/api/health` and downstream tooling,
//! per spec §4.10.

pub mod confusion;
pub mod elg;
pub mod lo_stats;
pub mod nfd;
pub mod reliability;
pub mod speed_accuracy;

use std::collections::HashSet;

use studyforge_domain::{AnalyticsSnapshot, AttemptEvent, Totals};
use studyforge_storage::EventLog;

/// Build a snapshot from the attempt event log at `events_path`, stamped
/// with `generated_at` (an ISO-8601 timestamp supplied by the caller, since
/// this crate never reads the clock itself).
pub async fn build_snapshot(
    events_path: &std::path::Path,
    generated_at: impl Into<String>,
    now_ms: i64,
) -> Result<AnalyticsSnapshot, studyforge_storage::StorageError> {
    let log = EventLog::new(events_path);
    let attempts: Vec<AttemptEvent> = log.read_all().await?;

    if attempts.is_empty() {
        return Ok(AnalyticsSnapshot::empty(generated_at));
    }

    let learners: HashSet<&str> = attempts.iter().map(|a| a.user_id.as_str()).collect();
    let ttm_per_lo = lo_stats::per_lo_entries(&attempts, now_ms);

    Ok(AnalyticsSnapshot {
        schema_version: studyforge_domain::ANALYTICS_SCHEMA_VERSION.to_string(),
        generated_at: generated_at.into(),
        has_events: true,
        totals: Totals {
            attempts: attempts.len() as u64,
            learners: learners.len() as u64,
        },
        elg_per_min: elg::top_candidates(&attempts, &ttm_per_lo),
        confusion_edges: confusion::edges(&attempts),
        speed_accuracy: speed_accuracy::bucket(&attempts),
        nfd_summary: nfd::detect(&attempts),
        reliability: reliability::compute(&attempts),
        ttm_per_lo,
    })
}
