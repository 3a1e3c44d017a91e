//! Speed-accuracy quadrant buckets, per spec §4.10.

use studyforge_domain::{AttemptEvent, SpeedAccuracy};

const SLOW_THRESHOLD_MS: u64 = 45_000;

pub fn bucket(attempts: &[AttemptEvent]) -> SpeedAccuracy {
    let mut result = SpeedAccuracy::default();
    for attempt in attempts {
        let slow = attempt.duration_ms >= SLOW_THRESHOLD_MS;
        match (slow, attempt.correct) {
            (false, false) => result.fast_wrong += 1,
            (true, false) => result.slow_wrong += 1,
            (false, true) => result.fast_right += 1,
            (true, true) => result.slow_right += 1,
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyforge_domain::{Choice, Mode};

    fn attempt(duration_ms: u64, correct: bool) -> AttemptEvent {
        AttemptEvent {
            schema_version: "1.1.0".to_string(),
            app_version: None,
            session_id: "s1".to_string(),
            user_id: "u1".to_string(),
            item_id: "item-1".to_string(),
            lo_ids: vec!["lo1".to_string()],
            ts_start: 0,
            ts_submit: duration_ms as i64,
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
    fn buckets_by_speed_and_correctness() {
        let attempts = vec![
            attempt(1_000, false),
            attempt(50_000, false),
            attempt(1_000, true),
            attempt(50_000, true),
        ];
        let result = bucket(&attempts);
        assert_eq!(result.fast_wrong, 1);
        assert_eq!(result.slow_wrong, 1);
        assert_eq!(result.fast_right, 1);
        assert_eq!(result.slow_right, 1);
    }

    #[test]
    fn exactly_at_threshold_counts_as_slow() {
        let attempts = vec![attempt(SLOW_THRESHOLD_MS, true)];
        let result = bucket(&attempts);
        assert_eq!(result.slow_right, 1);
        assert_eq!(result.fast_right, 0);
    }
}
