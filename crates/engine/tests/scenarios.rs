//! End-to-end scenario tests over the pure engine, covering concrete
//! examples worked through by hand.

use std::collections::HashMap;
use studyforge_domain::{Blueprint, Bloom, Choice, Difficulty, Evidence, Item, ItemStatus, LearnerState};
use studyforge_engine::{
    blueprint::{build_form_greedy, derive_lo_targets, BuildFormInput},
    personalization::PersonalizationEngine,
    selector::{select, CandidateItem, ExposureWindow, SelectorInput},
};

fn item(id: &str, lo: &str) -> Item {
    let mut choices = HashMap::new();
    let mut distractors = HashMap::new();
    for c in Choice::ALL {
        choices.insert(c, format!("choice {c:?}"));
        if c != Choice::A {
            distractors.insert(c, "no".to_string());
        }
    }
    Item {
        id: id.to_string(),
        stem: "stem".to_string(),
        choices,
        key: Choice::A,
        rationale_correct: "because".to_string(),
        rationale_distractors: distractors,
        los: vec![lo.to_string()],
        difficulty: Difficulty::Medium,
        bloom: Bloom::Apply,
        evidence: Evidence {
            file: "f.pdf".to_string(),
            page: 1,
            bbox: None,
            crop_path: None,
            citation: "p.1".to_string(),
        },
        status: ItemStatus::Published,
        rubric_score: 3.0,
        content_hash: "x".to_string(),
    }
}

#[test]
fn scenario_single_learner_drill() {
    let engine = PersonalizationEngine::default();
    let mut state = LearnerState::new("learner-1", "2026-01-01T00:00:00Z");

    for i in 0..12 {
        let difficulty = if i % 2 == 0 { Difficulty::Easy } else { Difficulty::Medium };
        let (next_state, _signals) = engine.update(
            state,
            &["lo1".to_string()],
            &format!("item-{i}"),
            difficulty,
            true,
            1_700_000_000_000 + i as i64 * 60_000,
        );
        state = next_state;
    }

    let lo = &state.los["lo1"];
    assert_eq!(lo.items_attempted, 12);
    assert!(lo.se <= 0.25, "expected se <= 0.25, got {}", lo.se);
    assert!(lo.theta_hat > 0.0);

    let decision = engine.should_stop(&state, "lo1");
    assert!(decision.should_stop);
    assert!(
        decision.triggers.contains(&"se_threshold".to_string())
            || decision.triggers.contains(&"probe_mastery_window".to_string())
    );
}

#[test]
fn scenario_blueprint_form_build_feasible() {
    let mut weights = HashMap::new();
    weights.insert("lo1".to_string(), 0.5);
    weights.insert("lo2".to_string(), 0.25);
    weights.insert("lo3".to_string(), 0.25);
    let bp = Blueprint {
        schema_version: None,
        id: "bp1".to_string(),
        weights,
    };

    let mut items = Vec::new();
    for lo in ["lo1", "lo2", "lo3"] {
        for i in 0..10 {
            items.push(item(&format!("{lo}-{i}"), lo));
        }
    }

    let targets = derive_lo_targets(&bp, 8);
    assert_eq!(targets["lo1"], 4);
    assert_eq!(targets["lo2"], 2);
    assert_eq!(targets["lo3"], 2);

    let form = build_form_greedy(BuildFormInput {
        blueprint: &bp,
        items: &items,
        form_length: 8,
        seed: 1,
    })
    .unwrap();

    assert_eq!(form.len(), 8);
    let unique: std::collections::HashSet<&String> = form.iter().collect();
    assert_eq!(unique.len(), 8);

    let replay = build_form_greedy(BuildFormInput {
        blueprint: &bp,
        items: &items,
        form_length: 8,
        seed: 1,
    })
    .unwrap();
    assert_eq!(form, replay);
}

#[test]
fn scenario_blueprint_form_build_infeasible() {
    let mut weights = HashMap::new();
    weights.insert("lo1".to_string(), 0.5);
    weights.insert("lo2".to_string(), 0.25);
    weights.insert("lo3".to_string(), 0.25);
    let bp = Blueprint {
        schema_version: None,
        id: "bp1".to_string(),
        weights,
    };

    let mut items = vec![item("lo1-0", "lo1"), item("lo1-1", "lo1")];
    for lo in ["lo2", "lo3"] {
        for i in 0..10 {
            items.push(item(&format!("{lo}-{i}"), lo));
        }
    }

    let err = build_form_greedy(BuildFormInput {
        blueprint: &bp,
        items: &items,
        form_length: 8,
        seed: 1,
    })
    .unwrap_err();

    let lo1 = err.deficits.iter().find(|d| d.lo_id == "lo1").unwrap();
    assert_eq!(lo1.needed, 4);
    assert_eq!(lo1.have, 2);
}

#[test]
fn scenario_selector_determinism() {
    let candidates = vec![
        CandidateItem {
            id: "A".to_string(),
            lo_ids: vec!["lo1".to_string()],
            beta: 0.0,
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
        },
        CandidateItem {
            id: "B".to_string(),
            lo_ids: vec!["lo1".to_string()],
            beta: 0.5,
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
        },
        CandidateItem {
            id: "C".to_string(),
            lo_ids: vec!["lo1".to_string()],
            beta: -0.2,
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
        },
    ];

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
    assert_eq!(first.pool.len(), 3);
}
