//! Personalization engine: the orchestrator that glues psychometrics,
//! selection, scheduling, and retention into the learner-facing
//! operations. Per spec §9's redesign note, this is a plain value type
//! carrying only `{name, version, seed}` — all mutable learner data lives
//! in `LearnerState`, never here.

use crate::psychometrics::{eap_update, mastery_probability, EapInput, Response};
use crate::scheduler::{self, Arm, ScheduleResult};
use crate::selector::{self, Selection, SelectorInput};
use studyforge_domain::{Difficulty, LearnerLoState, LearnerState};

const MIN_ITEMS_BEFORE_STOP: u32 = 12;
const STOP_SE_THRESHOLD: f64 = 0.2;
const STOP_PLATEAU_THRESHOLD: f64 = 0.02;
const PROBE_MASTERY_DELTA: f64 = 0.3;
const MASTERY_PROBABILITY_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone)]
pub struct PersonalizationEngine {
    pub name: String,
    pub version: String,
    pub seed: u32,
}

impl Default for PersonalizationEngine {
    fn default() -> Self {
        Self {
            name: "studyforge".to_string(),
            version: "1.1.0".to_string(),
            seed: 1,
        }
    }
}

impl PersonalizationEngine {
    pub fn with_seed(seed: u32) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Global `(theta_bar, se_bar)` averaged across the learner's LO
    /// states, with the documented cold-start defaults when empty.
    pub fn global_ability(&self, state: &LearnerState) -> (f64, f64) {
        state.global_ability()
    }

    pub fn suggest_next(
        &self,
        state: &LearnerState,
        candidates: Vec<selector::CandidateItem>,
        seed: u32,
    ) -> Option<(Selection, String)> {
        let (theta_bar, _se_bar) = self.global_ability(state);
        let selection = selector::select(SelectorInput {
            theta_hat: theta_bar,
            candidates,
            seed,
        })?;

        let (theta_hat, se) = state
            .los
            .get(selection.lo_ids.first()?)
            .map(|lo| (lo.theta_hat, lo.se))
            .unwrap_or((theta_bar, 0.8));
        let mastery = mastery_probability(theta_hat, se, 0.0);

        let rationale = format!(
            "Info {:.2} · Blueprint×{:.2} · Exposure×{:.2} · Fatigue×{:.2} · Median {:.2}s · θ̂={:.2} · SE={:.2} · Mastery={:.2}",
            selection.signals.info,
            selection.signals.blueprint_multiplier,
            selection.signals.exposure_multiplier,
            selection.signals.fatigue_scalar,
            selection.signals.median_time_seconds,
            theta_hat,
            se,
            mastery
        );

        Some((selection, rationale))
    }

    pub fn update(
        &self,
        mut state: LearnerState,
        lo_ids: &[String],
        item_id: &str,
        difficulty: Difficulty,
        correct: bool,
        ts: i64,
    ) -> (LearnerState, UpdateSignals) {
        let beta = difficulty.to_beta();
        let mut last_signals = UpdateSignals {
            theta_hat: 0.0,
            se: 0.8,
            mastery_probability: 0.0,
        };

        for lo_id in lo_ids {
            let lo = state.los.entry(lo_id.clone()).or_default();
            let prior_mu = lo.prior_mu;
            let prior_sigma = if lo.prior_sigma > 0.0 { lo.prior_sigma } else { 0.8 };

            let output = eap_update(EapInput {
                prior_mu,
                prior_sigma,
                response: Response {
                    k: if correct { 1 } else { 0 },
                    m: 1,
                },
                beta,
            });

            lo.theta_hat = output.theta_hat;
            lo.se = output.se;
            lo.items_attempted += 1;
            lo.push_se(output.se);
            lo.last_probe_difficulty = Some(beta);
            lo.sync_prior();

            let mastery = mastery_probability(output.theta_hat, output.se, 0.0);
            let probe_mastery = (output.theta_hat - beta).abs() <= PROBE_MASTERY_DELTA
                && mastery >= MASTERY_PROBABILITY_THRESHOLD;
            lo.mastery_confirmed = lo.mastery_confirmed || probe_mastery;

            last_signals = UpdateSignals {
                theta_hat: output.theta_hat,
                se: output.se,
                mastery_probability: mastery,
            };
        }

        let item = state.items.entry(item_id.to_string()).or_default();
        item.record(correct, ts);

        state.updated_at = crate::retrieval::iso8601_millis(ts);

        (state, last_signals)
    }

    pub fn should_stop(&self, state: &LearnerState, lo_id: &str) -> StopDecision {
        let Some(lo) = state.los.get(lo_id) else {
            return StopDecision {
                should_stop: false,
                triggers: vec![],
            };
        };
        should_stop_lo(lo)
    }

    pub fn schedule_next_lo(&self, arms: &[Arm], seed: u32) -> Option<ScheduleResult> {
        scheduler::schedule_next_lo(arms, seed)
    }

    pub fn compute_retention_budget(&self, max_days_overdue: f64, session_minutes: f64) -> RetentionBudget {
        let fraction = crate::retention::retention_budget(max_days_overdue);
        RetentionBudget {
            minutes: (session_minutes * fraction).floor() as u32,
            fraction,
        }
    }
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct UpdateSignals {
    pub theta_hat: f64,
    pub se: f64,
    pub mastery_probability: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StopDecision {
    pub should_stop: bool,
    pub triggers: Vec<String>,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct RetentionBudget {
    pub minutes: u32,
    pub fraction: f64,
}

fn should_stop_lo(lo: &LearnerLoState) -> StopDecision {
    if lo.items_attempted < MIN_ITEMS_BEFORE_STOP {
        return StopDecision {
            should_stop: false,
            triggers: vec![],
        };
    }

    let mut triggers = Vec::new();

    if lo.se <= STOP_SE_THRESHOLD {
        triggers.push("se_threshold".to_string());
    }
    if lo.mastery_confirmed {
        triggers.push("mastery_confirmed".to_string());
    }
    if plateaued(&lo.recent_ses) {
        triggers.push("se_plateau".to_string());
    }
    if let Some(probe) = lo.last_probe_difficulty {
        let mastery = mastery_probability(lo.theta_hat, lo.se, 0.0);
        if (lo.theta_hat - probe).abs() <= PROBE_MASTERY_DELTA
            && mastery >= MASTERY_PROBABILITY_THRESHOLD
        {
            triggers.push("probe_mastery_window".to_string());
        }
    }

    StopDecision {
        should_stop: !triggers.is_empty(),
        triggers,
    }
}

/// Mean of the absolute first-differences over the last 5 `recent_ses`
/// entries is below the plateau threshold.
fn plateaued(recent_ses: &[f64]) -> bool {
    if recent_ses.len() < 5 {
        return false;
    }
    let window = &recent_ses[recent_ses.len() - 5..];
    let diffs: Vec<f64> = window.windows(2).map(|pair| (pair[1] - pair[0]).abs()).collect();
    if diffs.is_empty() {
        return false;
    }
    let mean = diffs.iter().sum::<f64>() / diffs.len() as f64;
    mean < STOP_PLATEAU_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyforge_domain::LearnerState;

    #[test]
    fn single_learner_drill_reaches_stop_with_positive_theta() {
        let engine = PersonalizationEngine::default();
        let mut state = LearnerState::new("learner-1", "2026-01-01T00:00:00Z");

        for i in 0..12 {
            let difficulty = if i % 2 == 0 { Difficulty::Easy } else { Difficulty::Medium };
            let (next_state, _) = engine.update(
                state,
                &["lo1".to_string()],
                &format!("item-{i}"),
                difficulty,
                true,
                1_700_000_000_000 + i as i64 * 1000,
            );
            state = next_state;
        }

        let lo = &state.los["lo1"];
        assert_eq!(lo.items_attempted, 12);
        assert!(lo.theta_hat > 0.0);

        let decision = engine.should_stop(&state, "lo1");
        assert!(decision.should_stop);
    }

    #[test]
    fn should_stop_never_fires_before_minimum_attempts() {
        let engine = PersonalizationEngine::default();
        let mut state = LearnerState::new("learner-1", "2026-01-01T00:00:00Z");
        for i in 0..5 {
            let (next_state, _) = engine.update(
                state,
                &["lo1".to_string()],
                &format!("item-{i}"),
                Difficulty::Medium,
                true,
                1000 + i as i64,
            );
            state = next_state;
        }
        let decision = engine.should_stop(&state, "lo1");
        assert!(!decision.should_stop);
    }

    #[test]
    fn recent_ses_window_caps_at_ten_after_many_updates() {
        let engine = PersonalizationEngine::default();
        let mut state = LearnerState::new("learner-1", "2026-01-01T00:00:00Z");
        for i in 0..20 {
            let (next_state, _) = engine.update(
                state,
                &["lo1".to_string()],
                &format!("item-{i}"),
                Difficulty::Medium,
                i % 2 == 0,
                1000 + i as i64,
            );
            state = next_state;
        }
        assert_eq!(state.los["lo1"].recent_ses.len(), 10);
        assert_eq!(state.items.len(), 20);
    }

    #[test]
    fn retention_budget_floors_minutes() {
        let engine = PersonalizationEngine::default();
        let budget = engine.compute_retention_budget(8.0, 25.0);
        assert_eq!(budget.fraction, 0.6);
        assert_eq!(budget.minutes, 15);
    }
}
