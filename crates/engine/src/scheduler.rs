//! Cross-topic Thompson-sampling scheduler: picks the next LO to drill by
//! sampling each arm's Normal(μ, σ²) belief and scoring by urgency and
//! blueprint pull.

use crate::rng::{box_muller, Xorshift32};

#[derive(Debug, Clone)]
pub struct Arm {
    pub lo_id: String,
    pub mu: f64,
    pub sigma: f64,
    pub urgency: f64,
    pub blueprint_multiplier: f64,
    pub eligible: bool,
    pub cooldown_hours: f64,
}

const COOLDOWN_ELIGIBLE_HOURS: f64 = 96.0;

impl Arm {
    /// μ proxy for ΔSE headroom and σ derived from the current SE, per
    /// spec §4.3.
    pub fn from_se(lo_id: impl Into<String>, se: f64, days_since_last: f64, target_share: f64, current_share: f64) -> Self {
        let mu = (se - 0.2).max(0.01);
        let sigma = 0.3 + se * 0.2;
        let urgency = 1.0 + (days_since_last - 3.0).max(0.0) / 7.0;
        let blueprint_multiplier = blueprint_multiplier(target_share, current_share);
        let cooldown_hours = days_since_last * 24.0;
        Self {
            lo_id: lo_id.into(),
            mu,
            sigma,
            urgency,
            blueprint_multiplier,
            eligible: cooldown_hours >= COOLDOWN_ELIGIBLE_HOURS,
            cooldown_hours,
        }
    }
}

/// Multiplier pulling an LO's selection frequency toward its blueprint
/// target share.
pub fn blueprint_multiplier(target_share: f64, current_share: f64) -> f64 {
    if target_share == 0.0 {
        return 1.0;
    }
    if current_share > target_share {
        (1.0 - 2.0 * (current_share - target_share)).max(0.2)
    } else {
        (1.0 + 3.0 * (target_share - current_share)).min(1.5)
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ScheduleResult {
    pub lo_id: String,
    pub score: f64,
    pub sample: f64,
}

/// Sample each eligible arm (falling back to the full list when none are
/// eligible) and return the argmax by `sample * urgency * blueprint`.
pub fn schedule_next_lo(arms: &[Arm], seed: u32) -> Option<ScheduleResult> {
    if arms.is_empty() {
        return None;
    }

    let pool: Vec<&Arm> = {
        let eligible: Vec<&Arm> = arms.iter().filter(|a| a.eligible).collect();
        if eligible.is_empty() {
            arms.iter().collect()
        } else {
            eligible
        }
    };

    let mut rng = Xorshift32::new(seed);
    let mut best: Option<ScheduleResult> = None;

    for arm in pool {
        let z = box_muller(&mut rng);
        let sample = arm.mu + arm.sigma * z;
        let score = sample * arm.urgency * arm.blueprint_multiplier;

        let is_better = match &best {
            None => true,
            Some(current) => score > current.score,
        };
        if is_better {
            best = Some(ScheduleResult {
                lo_id: arm.lo_id.clone(),
                score,
                sample,
            });
        }
    }

    best
}
