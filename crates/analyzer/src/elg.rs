//! Expected-learning-gain-per-minute candidates, per spec §4.10: for each
//! item, relate its LOs' deficits to its average response time, and emit
//! the top 3 by `score = projectedGain / avgMinutes`.

use std::collections::HashMap;
use studyforge_domain::{AttemptEvent, ElgPerMinEntry, TtmEntry};

const TOP_N: usize = 3;
const MIN_MINUTES: f64 = 1.0 / 60.0;

struct ItemAccumulator {
    lo_ids: Vec<String>,
    total_duration_ms: u64,
    attempts: u32,
}

pub fn top_candidates(attempts: &[AttemptEvent], ttm_per_lo: &[TtmEntry]) -> Vec<ElgPerMinEntry> {
    let deficit_by_lo: HashMap<&str, f64> =
        ttm_per_lo.iter().map(|e| (e.lo_id.as_str(), e.deficit)).collect();

    let mut by_item: HashMap<&str, ItemAccumulator> = HashMap::new();
    for attempt in attempts {
        let acc = by_item.entry(attempt.item_id.as_str()).or_insert_with(|| ItemAccumulator {
            lo_ids: attempt.lo_ids.clone(),
            total_duration_ms: 0,
            attempts: 0,
        });
        acc.total_duration_ms += attempt.duration_ms;
        acc.attempts += 1;
    }

    let mut candidates: Vec<ElgPerMinEntry> = by_item
        .into_iter()
        .flat_map(|(item_id, acc)| {
            let avg_minutes = (acc.total_duration_ms as f64 / acc.attempts.max(1) as f64 / 60_000.0).max(MIN_MINUTES);
            let deficit_by_lo = &deficit_by_lo;
            acc.lo_ids.into_iter().map(move |lo_id| {
                let projected_gain = deficit_by_lo.get(lo_id.as_str()).copied().unwrap_or(0.0);
                let score = projected_gain / avg_minutes;
                ElgPerMinEntry {
                    item_id: item_id.to_string(),
                    lo_id,
                    projected_gain,
                    avg_minutes,
                    score,
                }
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    candidates.truncate(TOP_N);
    candidates
}
