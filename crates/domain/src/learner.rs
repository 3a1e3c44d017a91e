//! Per-learner state: ability estimates, item exposure, retention cards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rolling window capacities, per spec §3.
pub const RECENT_SES_WINDOW: usize = 10;
pub const RECENT_ATTEMPTS_WINDOW: usize = 20;

/// Floor for posterior SD, per spec §3.
pub const MIN_SE: f64 = 0.0001;
/// Floor for the EAP prior SD, per spec §3.
pub const MIN_PRIOR_SIGMA: f64 = 0.25;
/// Floor for FSRS half-life, in hours (1 minute), per spec §3.
pub const MIN_HALF_LIFE_HOURS: f64 = 1.0 / 60.0;

/// Per-learner, per-LO ability estimate and stopping-rule bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerLoState {
    pub theta_hat: f64,
    pub se: f64,
    pub items_attempted: u32,
    pub recent_ses: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_probe_difficulty: Option<f64>,
    pub mastery_confirmed: bool,
    pub prior_mu: f64,
    pub prior_sigma: f64,
}

impl Default for LearnerLoState {
    fn default() -> Self {
        Self {
            theta_hat: 0.0,
            se: 0.8,
            items_attempted: 0,
            recent_ses: Vec::new(),
            last_probe_difficulty: None,
            mastery_confirmed: false,
            prior_mu: 0.0,
            prior_sigma: 0.8,
        }
    }
}

impl LearnerLoState {
    /// Push a new SE value into the rolling window, keeping at most
    /// [`RECENT_SES_WINDOW`] entries (oldest evicted first).
    pub fn push_se(&mut self, se: f64) {
        self.recent_ses.push(se);
        if self.recent_ses.len() > RECENT_SES_WINDOW {
            let overflow = self.recent_ses.len() - RECENT_SES_WINDOW;
            self.recent_ses.drain(0..overflow);
        }
    }

    /// Re-establish the invariant `prior_mu = theta_hat`, `prior_sigma = max(0.25, se)`.
    pub fn sync_prior(&mut self) {
        self.prior_mu = self.theta_hat;
        self.prior_sigma = self.se.max(MIN_PRIOR_SIGMA);
    }
}

/// Per-learner, per-item attempt history.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LearnerItemState {
    pub attempts: u32,
    pub correct: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_ts: Option<i64>,
    pub recent_attempts: Vec<i64>,
}

impl LearnerItemState {
    pub fn record(&mut self, correct: bool, ts: i64) {
        self.attempts += 1;
        if correct {
            self.correct += 1;
        }
        self.last_attempt_ts = Some(ts);
        self.recent_attempts.push(ts);
        if self.recent_attempts.len() > RECENT_ATTEMPTS_WINDOW {
            let overflow = self.recent_attempts.len() - RECENT_ATTEMPTS_WINDOW;
            self.recent_attempts.drain(0..overflow);
        }
    }
}

/// FSRS-style retention card for a single (learner, item) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionCard {
    pub lo_ids: Vec<String>,
    pub half_life_hours: f64,
    pub next_review_ms: i64,
    pub last_review_ms: i64,
    pub lapses: u32,
}

impl RetentionCard {
    pub fn new(lo_ids: Vec<String>, now_ms: i64) -> Self {
        Self {
            lo_ids,
            half_life_hours: 24.0,
            next_review_ms: now_ms,
            last_review_ms: now_ms,
            lapses: 0,
        }
    }
}

/// The full per-learner document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerState {
    pub learner_id: String,
    pub updated_at: String,
    pub los: HashMap<String, LearnerLoState>,
    pub items: HashMap<String, LearnerItemState>,
    pub retention: HashMap<String, RetentionCard>,
}

impl LearnerState {
    /// Create a default-initialized state for a learner observed for the first time.
    pub fn new(learner_id: impl Into<String>, now_iso: impl Into<String>) -> Self {
        Self {
            learner_id: learner_id.into(),
            updated_at: now_iso.into(),
            los: HashMap::new(),
            items: HashMap::new(),
            retention: HashMap::new(),
        }
    }

    /// Sanitize a freshly-loaded or freshly-deserialized document: clamp
    /// numeric fields, truncate rolling windows, overwrite `learner_id`.
    /// Idempotent — sanitizing twice yields the same result.
    pub fn sanitize(mut self, expected_learner_id: &str) -> Self {
        self.learner_id = expected_learner_id.to_string();

        for lo in self.los.values_mut() {
            lo.se = lo.se.max(MIN_SE);
            lo.prior_sigma = lo.prior_sigma.max(MIN_PRIOR_SIGMA);
            if lo.recent_ses.len() > RECENT_SES_WINDOW {
                let overflow = lo.recent_ses.len() - RECENT_SES_WINDOW;
                lo.recent_ses.drain(0..overflow);
            }
        }

        for item in self.items.values_mut() {
            item.correct = item.correct.min(item.attempts);
            if item.recent_attempts.len() > RECENT_ATTEMPTS_WINDOW {
                let overflow = item.recent_attempts.len() - RECENT_ATTEMPTS_WINDOW;
                item.recent_attempts.drain(0..overflow);
            }
        }

        for card in self.retention.values_mut() {
            card.half_life_hours = card.half_life_hours.max(MIN_HALF_LIFE_HOURS);
        }

        self
    }

    /// Average `(theta_hat, se)` across the learner's LO states, with the
    /// documented cold-start defaults when the learner has no LO states yet.
    pub fn global_ability(&self) -> (f64, f64) {
        if self.los.is_empty() {
            return (0.0, 0.8);
        }
        let n = self.los.len() as f64;
        let theta_sum: f64 = self.los.values().map(|s| s.theta_hat).sum();
        let se_sum: f64 = self.los.values().map(|s| s.se).sum();
        (theta_sum / n, se_sum / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_se_caps_window_at_ten() {
        let mut lo = LearnerLoState::default();
        for i in 0..15 {
            lo.push_se(i as f64);
        }
        assert_eq!(lo.recent_ses.len(), RECENT_SES_WINDOW);
        assert_eq!(lo.recent_ses.first().copied(), Some(5.0));
    }

    #[test]
    fn sync_prior_matches_invariant() {
        let mut lo = LearnerLoState::default();
        lo.theta_hat = 1.2;
        lo.se = 0.1;
        lo.sync_prior();
        assert_eq!(lo.prior_mu, 1.2);
        assert_eq!(lo.prior_sigma, MIN_PRIOR_SIGMA);
    }

    #[test]
    fn sanitize_is_idempotent() {
        let mut state = LearnerState::new("learner-1", "2026-01-01T00:00:00Z");
        state.los.insert(
            "lo1".to_string(),
            LearnerLoState {
                se: 1e-9,
                ..Default::default()
            },
        );
        let once = state.clone().sanitize("learner-1");
        let twice = once.clone().sanitize("learner-1");
        assert_eq!(
            serde_json::to_string(&once).unwrap(),
            serde_json::to_string(&twice).unwrap()
        );
    }

    #[test]
    fn sanitize_overwrites_learner_id() {
        let state = LearnerState::new("wrong-id", "2026-01-01T00:00:00Z");
        let sanitized = state.sanitize("correct-id");
        assert_eq!(sanitized.learner_id, "correct-id");
    }

    #[test]
    fn global_ability_defaults_when_empty() {
        let state = LearnerState::new("learner-1", "2026-01-01T00:00:00Z");
        assert_eq!(state.global_ability(), (0.0, 0.8));
    }
}
