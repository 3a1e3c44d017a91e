//! In-session item selector: Fisher-information utility scored against
//! median response time, blueprint pull, exposure, and fatigue, with a
//! seeded randomesque top-K pick.

use crate::psychometrics::info;
use crate::rng::Xorshift32;
use std::collections::HashMap;

const TOP_K: usize = 5;

#[derive(Debug, Clone)]
pub struct ExposureWindow {
    pub last24h: u32,
    pub last7d: u32,
    pub hours_since_last: f64,
    pub mean_score: f64,
    pub se: f64,
}

#[derive(Debug, Clone)]
pub struct CandidateItem {
    pub id: String,
    pub lo_ids: Vec<String>,
    pub beta: f64,
    pub thresholds: Option<Vec<f64>>,
    pub median_time_seconds: f64,
    pub blueprint_multiplier: f64,
    pub exposure: ExposureWindow,
    pub fatigue_scalar: f64,
}

pub struct SelectorInput {
    pub theta_hat: f64,
    pub candidates: Vec<CandidateItem>,
    pub seed: u32,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CandidateSignals {
    pub id: String,
    pub info: f64,
    pub utility: f64,
    pub blueprint_multiplier: f64,
    pub exposure_multiplier: f64,
    pub fatigue_scalar: f64,
    pub median_time_seconds: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Selection {
    pub item_id: String,
    pub lo_ids: Vec<String>,
    pub signals: CandidateSignals,
    pub pool: Vec<CandidateSignals>,
}

/// Default exposure multiplier: stays at 1 per spec §9. The familiarity
/// clamp and the daily/weekly caps are the pluggable
/// [`crate::retention::CappedExposure`] policy, not this default path.
fn exposure_multiplier(_exposure: &ExposureWindow) -> f64 {
    1.0
}

pub fn select(input: SelectorInput) -> Option<Selection> {
    let mut scored: Vec<(CandidateSignals, String, Vec<String>)> = Vec::new();

    for candidate in &input.candidates {
        let exposure_mult = exposure_multiplier(&candidate.exposure);
        if exposure_mult == 0.0 || candidate.blueprint_multiplier == 0.0 || candidate.fatigue_scalar == 0.0
        {
            continue;
        }

        let item_info = info(input.theta_hat, candidate.beta, candidate.thresholds.as_deref());
        let utility = item_info / candidate.median_time_seconds.max(1.0)
            * candidate.blueprint_multiplier
            * exposure_mult
            * candidate.fatigue_scalar;

        if utility <= 0.0 {
            continue;
        }

        scored.push((
            CandidateSignals {
                id: candidate.id.clone(),
                info: item_info,
                utility,
                blueprint_multiplier: candidate.blueprint_multiplier,
                exposure_multiplier: exposure_mult,
                fatigue_scalar: candidate.fatigue_scalar,
                median_time_seconds: candidate.median_time_seconds,
            },
            candidate.id.clone(),
            candidate.lo_ids.clone(),
        ));
    }

    if scored.is_empty() {
        return None;
    }

    // Descending utility, stable tie-break on id.
    scored.sort_by(|(a, id_a, _), (b, id_b, _)| {
        b.utility
            .partial_cmp(&a.utility)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| id_a.cmp(id_b))
    });

    let k = TOP_K.min(scored.len());
    let top = &scored[..k];

    let mut rng = Xorshift32::new(input.seed);
    let pick_index = rng.next_below(k);
    let (signals, item_id, lo_ids) = top[pick_index].clone();

    let pool = scored.iter().map(|(s, _, _)| s.clone()).collect();

    Some(Selection {
        item_id,
        lo_ids,
        signals,
        pool,
    })
}

/// Build an exposure lookup keyed by candidate id, convenience for callers
/// assembling [`CandidateItem`]s from a `LearnerItemState` map.
pub fn exposure_from_counts(
    counts_by_item: &HashMap<String, (u32, u32, f64, f64, f64)>,
    item_id: &str,
) -> ExposureWindow {
    match counts_by_item.get(item_id) {
        Some(&(last24h, last7d, hours_since_last, mean_score, se)) => ExposureWindow {
            last24h,
            last7d,
            hours_since_last,
            mean_score,
            se,
        },
        None => ExposureWindow {
            last24h: 0,
            last7d: 0,
            hours_since_last: f64::MAX,
            mean_score: 0.0,
            se: 0.8,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, beta: f64) -> CandidateItem {
        CandidateItem {
            id: id.to_string(),
            lo_ids: vec!["lo1".to_string()],
            beta,
            thresholds: None,
            median_time_seconds: 60.0,
            blueprint_multiplier: 1.0,
            exposure: ExposureWindow {
                last24h: 0,
                last7d: 0,
                hours_since_last: 1000.0,
                mean_score: 0.5,
                se: 0.5,
            },
            fatigue_scalar: 1.0,
        }
    }

    #[test]
    fn empty_candidates_yield_none() {
        let result = select(SelectorInput {
            theta_hat: 0.3,
            candidates: vec![],
            seed: 1,
        });
        assert!(result.is_none());
    }

    #[test]
    fn zero_multiplier_candidates_are_dropped() {
        let mut c = candidate("a", 0.0);
        c.blueprint_multiplier = 0.0;
        let result = select(SelectorInput {
            theta_hat: 0.3,
            candidates: vec![c],
            seed: 1,
        });
        assert!(result.is_none());
    }

    #[test]
    fn selection_is_deterministic_for_a_fixed_seed() {
        let candidates = vec![candidate("a", 0.0), candidate("b", 0.5), candidate("c", -0.2)];
        let first = select(SelectorInput {
            theta_hat: 0.3,
            candidates: candidates.clone(),
            seed: 1,
        })
        .unwrap();
        let second = select(SelectorInput {
            theta_hat: 0.3,
            candidates,
            seed: 1,
        })
        .unwrap();
        assert_eq!(first.item_id, second.item_id);
    }

    #[test]
    fn different_seeds_can_change_the_pick() {
        let candidates = vec![candidate("a", 0.0), candidate("b", 0.5), candidate("c", -0.2)];
        let picks: std::collections::HashSet<String> = (0..20)
            .map(|seed| {
                select(SelectorInput {
                    theta_hat: 0.3,
                    candidates: candidates.clone(),
                    seed,
                })
                .unwrap()
                .item_id
            })
            .collect();
        assert!(picks.len() > 1);
    }

    #[test]
    fn default_exposure_multiplier_does_not_drop_familiar_items() {
        let mut c = candidate("a", 0.0);
        c.exposure.mean_score = 0.95;
        c.exposure.se = 0.1;
        let result = select(SelectorInput {
            theta_hat: 0.3,
            candidates: vec![c],
            seed: 1,
        });
        assert!(result.is_some());
    }
}
