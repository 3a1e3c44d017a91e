//! Reliability: KR-20 across sessions, and per-item point-biserial
//! correlation excluding the item's own contribution to the total score,
//! per spec §4.10.

use std::collections::HashMap;
use studyforge_domain::{AttemptEvent, ItemPointBiserial, Reliability};

const MIN_ITEMS_PER_SESSION: usize = 2;
const MIN_ATTEMPTS_PER_LEARNER: usize = 2;
const MIN_LEARNERS_FOR_BISERIAL: usize = 2;

pub fn compute(attempts: &[AttemptEvent]) -> Reliability {
    Reliability {
        kr20: kr20(attempts),
        item_point_biserial: point_biserial(attempts),
    }
}

fn kr20(attempts: &[AttemptEvent]) -> Option<f64> {
    let mut by_session: HashMap<&str, Vec<&AttemptEvent>> = HashMap::new();
    for attempt in attempts {
        by_session.entry(attempt.session_id.as_str()).or_default().push(attempt);
    }

    let eligible: Vec<&Vec<&AttemptEvent>> = by_session
        .values()
        .filter(|session_attempts| {
            let distinct_items: std::collections::HashSet<&str> =
                session_attempts.iter().map(|a| a.item_id.as_str()).collect();
            distinct_items.len() >= MIN_ITEMS_PER_SESSION
        })
        .collect();

    if eligible.len() < 2 {
        return None;
    }

    let mut item_correct_counts: HashMap<&str, u32> = HashMap::new();
    let mut item_total_counts: HashMap<&str, u32> = HashMap::new();
    let mut session_scores: Vec<f64> = Vec::new();

    for session_attempts in &eligible {
        let mut score = 0.0;
        for attempt in session_attempts.iter() {
            *item_total_counts.entry(attempt.item_id.as_str()).or_insert(0) += 1;
            if attempt.correct {
                *item_correct_counts.entry(attempt.item_id.as_str()).or_insert(0) += 1;
                score += 1.0;
            }
        }
        session_scores.push(score);
    }

    let k = item_total_counts.len() as f64;
    if k < 2.0 {
        return None;
    }

    let variance = population_variance(&session_scores);
    if variance <= 0.0 {
        return None;
    }

    let sum_pq: f64 = item_total_counts
        .iter()
        .map(|(item_id, total)| {
            let correct = *item_correct_counts.get(item_id).unwrap_or(&0) as f64;
            let p = correct / *total as f64;
            p * (1.0 - p)
        })
        .sum();

    Some((k / (k - 1.0)) * (1.0 - sum_pq / variance))
}

fn point_biserial(attempts: &[AttemptEvent]) -> Vec<ItemPointBiserial> {
    let mut by_user: HashMap<&str, Vec<&AttemptEvent>> = HashMap::new();
    for attempt in attempts {
        by_user.entry(attempt.user_id.as_str()).or_default().push(attempt);
    }

    let qualifying_users: HashMap<&str, &Vec<&AttemptEvent>> = by_user
        .iter()
        .filter(|(_, a)| a.len() >= MIN_ATTEMPTS_PER_LEARNER)
        .map(|(id, a)| (*id, a))
        .collect();

    if qualifying_users.len() < MIN_LEARNERS_FOR_BISERIAL {
        return Vec::new();
    }

    let mut by_item: HashMap<&str, Vec<(f64, f64)>> = HashMap::new();
    for user_attempts in qualifying_users.values() {
        let total_correct: f64 = user_attempts.iter().filter(|a| a.correct).count() as f64;
        for attempt in user_attempts.iter() {
            let item_correct = if attempt.correct { 1.0 } else { 0.0 };
            let rest_score = total_correct - item_correct;
            by_item
                .entry(attempt.item_id.as_str())
                .or_default()
                .push((item_correct, rest_score));
        }
    }

    let mut results: Vec<ItemPointBiserial> = by_item
        .into_iter()
        .filter_map(|(item_id, pairs)| {
            if pairs.len() < MIN_LEARNERS_FOR_BISERIAL {
                return None;
            }
            pearson(&pairs).map(|value| ItemPointBiserial {
                item_id: item_id.to_string(),
                value,
            })
        })
        .collect();

    results.sort_by(|a, b| a.item_id.cmp(&b.item_id));
    results
}

fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in pairs {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }

    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }

    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyforge_domain::{Choice, Mode};

    fn attempt(user_id: &str, session_id: &str, item_id: &str, correct: bool) -> AttemptEvent {
        AttemptEvent {
            schema_version: "1.1.0".to_string(),
            app_version: None,
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            item_id: item_id.to_string(),
            lo_ids: vec!["lo1".to_string()],
            ts_start: 0,
            ts_submit: 1_000,
            duration_ms: 1_000,
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
    fn kr20_is_none_with_fewer_than_two_eligible_sessions() {
        let attempts = vec![attempt("u1", "s1", "item-1", true)];
        assert_eq!(kr20(&attempts), None);
    }

    #[test]
    fn kr20_is_none_when_variance_is_zero() {
        let attempts = vec![
            attempt("u1", "s1", "item-1", true),
            attempt("u1", "s1", "item-2", true),
            attempt("u2", "s2", "item-1", true),
            attempt("u2", "s2", "item-2", true),
        ];
        assert_eq!(kr20(&attempts), None);
    }

    #[test]
    fn point_biserial_empty_with_insufficient_learners() {
        let attempts = vec![attempt("u1", "s1", "item-1", true), attempt("u1", "s1", "item-2", false)];
        assert!(point_biserial(&attempts).is_empty());
    }

    #[test]
    fn point_biserial_computed_with_enough_learners() {
        let attempts = vec![
            attempt("u1", "s1", "item-1", true),
            attempt("u1", "s1", "item-2", true),
            attempt("u2", "s2", "item-1", false),
            attempt("u2", "s2", "item-2", false),
        ];
        let result = point_biserial(&attempts);
        assert!(!result.is_empty());
    }
}
