//! Confusion edges: for incorrect attempts, `(lo_id, item_id, choice) →
//! count`, sorted descending, per spec §4.10.

use std::collections::HashMap;
use studyforge_domain::{AttemptEvent, ConfusionEdge};

pub fn edges(attempts: &[AttemptEvent]) -> Vec<ConfusionEdge> {
    let mut counts: HashMap<(String, String, String), u64> = HashMap::new();

    for attempt in attempts {
        if attempt.correct {
            continue;
        }
        let choice = format!("{:?}", attempt.choice);
        for lo_id in &attempt.lo_ids {
            *counts
                .entry((lo_id.clone(), attempt.item_id.clone(), choice.clone()))
                .or_insert(0) += 1;
        }
    }

    let mut edges: Vec<ConfusionEdge> = counts
        .into_iter()
        .map(|((lo_id, item_id, choice), count)| ConfusionEdge {
            lo_id,
            item_id,
            choice,
            count,
        })
        .collect();

    edges.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.lo_id.cmp(&b.lo_id))
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyforge_domain::{Choice, Mode};

    fn attempt(item_id: &str, choice: Choice, correct: bool) -> AttemptEvent {
        AttemptEvent {
            schema_version: "1.1.0".to_string(),
            app_version: None,
            session_id: "s1".to_string(),
            user_id: "u1".to_string(),
            item_id: item_id.to_string(),
            lo_ids: vec!["lo1".to_string()],
            ts_start: 0,
            ts_submit: 1_000,
            duration_ms: 1_000,
            mode: Mode::Drill,
            choice,
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
    fn only_incorrect_attempts_are_counted() {
        let attempts = vec![attempt("item-1", Choice::B, false), attempt("item-1", Choice::A, true)];
        let edges = edges(&attempts);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].choice, "B");
    }

    #[test]
    fn sorted_by_count_descending() {
        let attempts = vec![
            attempt("item-1", Choice::B, false),
            attempt("item-1", Choice::B, false),
            attempt("item-1", Choice::C, false),
        ];
        let edges = edges(&attempts);
        assert_eq!(edges[0].choice, "B");
        assert_eq!(edges[0].count, 2);
    }
}
