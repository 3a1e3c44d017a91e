//! Non-functional distractor detection, per spec §4.10: for items with
//! ≥ 20 attempts, flag any choice whose pick rate is below 5% and whose
//! Wilson upper bound (z = 1.96) is below 10%.

use std::collections::HashMap;
use studyforge_domain::{AttemptEvent, NfdEntry};

const MIN_ATTEMPTS: u32 = 20;
const MAX_PICK_RATE: f64 = 0.05;
const MAX_WILSON_UPPER: f64 = 0.10;
const Z: f64 = 1.96;

struct ItemAccumulator {
    total: u32,
    correct_choice: Option<String>,
    picks: HashMap<String, u32>,
}

pub fn detect(attempts: &[AttemptEvent]) -> Vec<NfdEntry> {
    let mut by_item: HashMap<&str, ItemAccumulator> = HashMap::new();

    for attempt in attempts {
        let choice = format!("{:?}", attempt.choice);
        let acc = by_item.entry(attempt.item_id.as_str()).or_insert_with(|| ItemAccumulator {
            total: 0,
            correct_choice: None,
            picks: HashMap::new(),
        });
        acc.total += 1;
        *acc.picks.entry(choice.clone()).or_insert(0) += 1;
        if attempt.correct {
            acc.correct_choice = Some(choice);
        }
    }

    let mut entries: Vec<NfdEntry> = Vec::new();
    for (item_id, acc) in &by_item {
        if acc.total < MIN_ATTEMPTS {
            continue;
        }
        let Some(correct_choice) = &acc.correct_choice else {
            continue;
        };

        for (choice, count) in &acc.picks {
            if choice == correct_choice {
                continue;
            }
            let pick_rate = *count as f64 / acc.total as f64;
            if pick_rate >= MAX_PICK_RATE {
                continue;
            }
            let upper = wilson_upper_bound(*count, acc.total, Z);
            if upper < MAX_WILSON_UPPER {
                entries.push(NfdEntry {
                    item_id: item_id.to_string(),
                    choice: choice.clone(),
                    pick_rate,
                    wilson_upper_bound: upper,
                });
            }
        }
    }

    entries.sort_by(|a, b| {
        a.item_id
            .cmp(&b.item_id)
            .then_with(|| a.choice.cmp(&b.choice))
    });
    entries
}

fn wilson_upper_bound(count: u32, total: u32, z: f64) -> f64 {
    let n = total as f64;
    let phat = count as f64 / n;
    let z2 = z * z;
    let center = phat + z2 / (2.0 * n);
    let adjustment = z * ((phat * (1.0 - phat) / n) + (z2 / (4.0 * n * n))).sqrt();
    let denominator = 1.0 + z2 / n;
    (center + adjustment) / denominator
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
    fn below_threshold_attempts_are_ignored() {
        let attempts = vec![attempt("item-1", Choice::A, true); 5];
        assert!(detect(&attempts).is_empty());
    }

    #[test]
    fn rarely_picked_distractor_is_flagged() {
        let mut attempts: Vec<AttemptEvent> = (0..19).map(|_| attempt("item-1", Choice::A, true)).collect();
        attempts.push(attempt("item-1", Choice::D, false));
        let entries = detect(&attempts);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].choice, "D");
    }

    #[test]
    fn commonly_picked_distractor_is_not_flagged() {
        let mut attempts: Vec<AttemptEvent> = (0..15).map(|_| attempt("item-1", Choice::A, true)).collect();
        attempts.extend((0..10).map(|_| attempt("item-1", Choice::B, false)));
        assert!(detect(&attempts).is_empty());
    }
}
