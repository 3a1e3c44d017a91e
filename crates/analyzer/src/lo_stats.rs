//! Per-LO accuracy, deficit, time-to-mastery, and overdue flag, per spec §4.10.

use std::collections::HashMap;
use studyforge_domain::{AttemptEvent, TtmEntry};

const TARGET_ACCURACY: f64 = 0.82;
const GAIN_PER_ATTEMPT: f64 = 0.12;
const OVERDUE_MS: i64 = 3 * 24 * 60 * 60 * 1000;

struct LoAccumulator {
    attempts: u32,
    correct: u32,
    total_duration_ms: u64,
    last_attempt_ts: i64,
}

impl Default for LoAccumulator {
    fn default() -> Self {
        Self {
            attempts: 0,
            correct: 0,
            total_duration_ms: 0,
            last_attempt_ts: i64::MIN,
        }
    }
}

pub fn per_lo_entries(attempts: &[AttemptEvent], now_ms: i64) -> Vec<TtmEntry> {
    let mut by_lo: HashMap<&str, LoAccumulator> = HashMap::new();

    for attempt in attempts {
        for lo_id in &attempt.lo_ids {
            let acc = by_lo.entry(lo_id.as_str()).or_default();
            acc.attempts += 1;
            if attempt.correct {
                acc.correct += 1;
            }
            acc.total_duration_ms += attempt.duration_ms;
            acc.last_attempt_ts = acc.last_attempt_ts.max(attempt.ts_submit);
        }
    }

    let mut entries: Vec<TtmEntry> = by_lo
        .into_iter()
        .map(|(lo_id, acc)| {
            let accuracy = if acc.attempts == 0 {
                0.0
            } else {
                acc.correct as f64 / acc.attempts as f64
            };
            let avg_duration_sec = if acc.attempts == 0 {
                0.0
            } else {
                (acc.total_duration_ms as f64 / acc.attempts as f64) / 1000.0
            };
            let deficit = (TARGET_ACCURACY - accuracy).max(0.0);
            let attempts_needed = (deficit / GAIN_PER_ATTEMPT).ceil() as u32;
            let projected_minutes_to_mastery =
                ((attempts_needed as f64 * avg_duration_sec / 60.0) * 100.0).round() / 100.0;
            let overdue = now_ms - acc.last_attempt_ts > OVERDUE_MS;

            TtmEntry {
                lo_id: lo_id.to_string(),
                accuracy,
                avg_duration_sec,
                deficit,
                attempts_needed,
                projected_minutes_to_mastery,
                overdue,
            }
        })
        .collect();

    entries.sort_by(|a, b| a.lo_id.cmp(&b.lo_id));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyforge_domain::{Choice, Mode};

    fn attempt(lo_id: &str, correct: bool, duration_ms: u64, ts_submit: i64) -> AttemptEvent {
        AttemptEvent {
            schema_version: "1.1.0".to_string(),
            app_version: None,
            session_id: "s1".to_string(),
            user_id: "u1".to_string(),
            item_id: "item-1".to_string(),
            lo_ids: vec![lo_id.to_string()],
            ts_start: ts_submit - duration_ms as i64,
            ts_submit,
            duration_ms,
            mode: Mode::Drill,
            choice: Choice::A,
            correct,
            confidence: None,
            opened_evidence: false,
            flagged: None,
            rationale_opened: None,
            keyboard_only: None,
            device_class: None,
            net_state: None,
            paused_ms: None,
            hint_used: None,
            difficulty: None,
        }
    }

    #[test]
    fn perfect_accuracy_has_zero_deficit() {
        let attempts = vec![attempt("lo1", true, 10_000, 1_000)];
        let entries = per_lo_entries(&attempts, 2_000);
        assert_eq!(entries[0].deficit, 0.0);
        assert_eq!(entries[0].attempts_needed, 0);
    }

    #[test]
    fn all_wrong_needs_attempts_to_close_deficit() {
        let attempts = vec![attempt("lo1", false, 10_000, 1_000)];
        let entries = per_lo_entries(&attempts, 2_000);
        assert!((entries[0].deficit - 0.82).abs() < 1e-9);
        assert_eq!(entries[0].attempts_needed, 7);
    }

    #[test]
    fn overdue_when_last_attempt_older_than_three_days() {
        let attempts = vec![attempt("lo1", true, 1_000, 0)];
        let now_ms = 4 * 24 * 60 * 60 * 1000;
        let entries = per_lo_entries(&attempts, now_ms);
        assert!(entries[0].overdue);
    }
}
