//! Item bank types: assessment items, learning objectives, blueprints.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The five fixed answer slots an item's choices are indexed by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Choice {
    A,
    B,
    C,
    D,
    E,
}

impl Choice {
    pub const ALL: [Choice; 5] = [Choice::A, Choice::B, Choice::C, Choice::D, Choice::E];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Map difficulty to a Rasch item-location parameter, per spec §4.1.
    pub fn to_beta(self) -> f64 {
        match self {
            Difficulty::Easy => -0.7,
            Difficulty::Medium => 0.0,
            Difficulty::Hard => 0.7,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Bloom {
    Remember,
    Understand,
    Apply,
    Analyze,
    Evaluate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Draft,
    Review,
    Published,
}

/// File/page citation for an item, with an optional crop region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub file: String,
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_path: Option<String>,
    pub citation: String,
}

/// An assessment item: a single multiple-choice question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub stem: String,
    pub choices: HashMap<Choice, String>,
    pub key: Choice,
    pub rationale_correct: String,
    pub rationale_distractors: HashMap<Choice, String>,
    pub los: Vec<String>,
    pub difficulty: Difficulty,
    pub bloom: Bloom,
    pub evidence: Evidence,
    pub status: ItemStatus,
    pub rubric_score: f64,
    pub content_hash: String,
}

impl Item {
    /// Minimum rubric score a published item must carry, per spec §3.
    pub const MIN_PUBLISHED_RUBRIC_SCORE: f64 = 2.7;

    /// Validate the structural invariants from spec §3. Returns a list of
    /// human-readable violations; empty means the item is well-formed.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for choice in Choice::ALL {
            if !self.choices.contains_key(&choice) {
                errors.push(format!("missing choice {choice:?}"));
            }
        }

        if !self.choices.contains_key(&self.key) {
            errors.push(format!("key {:?} is not among the choices", self.key));
        }

        for choice in Choice::ALL {
            if choice != self.key && !self.rationale_distractors.contains_key(&choice) {
                errors.push(format!("missing distractor rationale for {choice:?}"));
            }
        }

        if self.rationale_correct.trim().is_empty() {
            errors.push("rationale_correct is empty".to_string());
        }

        if self.los.is_empty() {
            errors.push("los must be non-empty".to_string());
        }

        if !(0.0..=3.0).contains(&self.rubric_score) {
            errors.push(format!("rubric_score {} out of range [0,3]", self.rubric_score));
        }

        if self.status == ItemStatus::Published
            && self.rubric_score < Self::MIN_PUBLISHED_RUBRIC_SCORE
        {
            errors.push(format!(
                "published item has rubric_score {} < {}",
                self.rubric_score,
                Self::MIN_PUBLISHED_RUBRIC_SCORE
            ));
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

/// An atomic assessable concept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningObjective {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// Target distribution of assessment items across learning objectives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blueprint {
    #[serde(default)]
    pub schema_version: Option<String>,
    pub id: String,
    pub weights: HashMap<String, f64>,
}

/// An assembled exam form: the ordered item ids a `/api/forms/build` call
/// produced from a blueprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamForm {
    pub blueprint_id: String,
    pub item_ids: Vec<String>,
    pub length: usize,
}
