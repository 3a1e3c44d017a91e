//! Schema-versioned telemetry events and the in-process event-bus payloads
//! derived from them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::item::{Choice, Difficulty};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Learn,
    Exam,
    Drill,
    Spotter,
}

/// Self-reported confidence, wire-encoded as the integer `1`/`2`/`3` per
/// spec §3 rather than by variant name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub enum Confidence {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl TryFrom<u8> for Confidence {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Confidence::Low),
            2 => Ok(Confidence::Medium),
            3 => Ok(Confidence::High),
            other => Err(format!("confidence must be 1, 2, or 3, got {other}")),
        }
    }
}

impl From<Confidence> for u8 {
    fn from(value: Confidence) -> Self {
        value as u8
    }
}

/// A single attempt at an item, as ingested over `/api/attempts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptEvent {
    pub schema_version: String,
    #[serde(default)]
    pub app_version: Option<String>,
    pub session_id: String,
    pub user_id: String,
    pub item_id: String,
    pub lo_ids: Vec<String>,
    pub ts_start: i64,
    pub ts_submit: i64,
    pub duration_ms: u64,
    pub mode: Mode,
    pub choice: Choice,
    pub correct: bool,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    #[serde(default)]
    pub opened_evidence: bool,
    #[serde(default)]
    pub flagged: Option<bool>,
    #[serde(default)]
    pub rationale_opened: Option<bool>,
    #[serde(default)]
    pub keyboard_only: Option<bool>,
    #[serde(default)]
    pub device_class: Option<String>,
    #[serde(default)]
    pub net_state: Option<String>,
    #[serde(default)]
    pub paused_ms: Option<u64>,
    #[serde(default)]
    pub hint_used: Option<bool>,
    /// Declared item difficulty at attempt time, threaded through so the
    /// engine does not need to re-look-up the item bank on every attempt.
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

impl AttemptEvent {
    /// Validate the envelope invariants from spec §3, independent of schema
    /// version matching (checked by the caller against the engine's declared
    /// value).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.ts_submit < self.ts_start {
            errors.push("ts_submit must be >= ts_start".to_string());
        }
        if self.lo_ids.is_empty() {
            errors.push("lo_ids must be non-empty".to_string());
        }
        errors
    }
}

/// A learning session envelope, as ingested over `/api/sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub schema_version: String,
    pub session_id: String,
    pub user_id: String,
    pub mode: Mode,
    #[serde(default)]
    pub blueprint_id: Option<String>,
    pub start_ts: i64,
    #[serde(default)]
    pub end_ts: Option<i64>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub mastery_by_lo: Option<HashMap<String, f64>>,
}

/// Bus event payload emitted when an attempt is ingested and committed to
/// learner state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSubmitted {
    pub learner_id: String,
    pub item_id: String,
    pub lo_ids: Vec<String>,
    pub difficulty: Difficulty,
    pub correct: bool,
    pub ts: i64,
}

/// Bus event payload emitted after `StateService` commits an update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateUpdated {
    pub learner_id: String,
    pub state: crate::learner::LearnerState,
    pub reason: String,
    pub ts: i64,
}

/// A lesson artifact, partially integrated per spec §9 — emitted but not
/// yet consumed by the analytics path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub lo_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveLessonRequested {
    pub lesson: Lesson,
    pub request_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonCreated {
    pub lesson: Lesson,
    pub job_id: String,
    pub ts: i64,
}
