//! The analyzer's offline output, and shared HTTP response DTOs.

use serde::{Deserialize, Serialize};

pub const ANALYTICS_SCHEMA_VERSION: &str = "1.1.0";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Totals {
    pub attempts: u64,
    pub learners: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtmEntry {
    pub lo_id: String,
    pub accuracy: f64,
    pub avg_duration_sec: f64,
    pub deficit: f64,
    pub attempts_needed: u32,
    pub projected_minutes_to_mastery: f64,
    pub overdue: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElgPerMinEntry {
    pub item_id: String,
    pub lo_id: String,
    pub projected_gain: f64,
    pub avg_minutes: f64,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfusionEdge {
    pub lo_id: String,
    pub item_id: String,
    pub choice: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SpeedAccuracy {
    pub fast_wrong: u64,
    pub slow_wrong: u64,
    pub fast_right: u64,
    pub slow_right: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NfdEntry {
    pub item_id: String,
    pub choice: String,
    pub pick_rate: f64,
    pub wilson_upper_bound: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemPointBiserial {
    pub item_id: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Reliability {
    pub kr20: Option<f64>,
    pub item_point_biserial: Vec<ItemPointBiserial>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub schema_version: String,
    pub generated_at: String,
    pub has_events: bool,
    pub totals: Totals,
    pub ttm_per_lo: Vec<TtmEntry>,
    pub elg_per_min: Vec<ElgPerMinEntry>,
    pub confusion_edges: Vec<ConfusionEdge>,
    pub speed_accuracy: SpeedAccuracy,
    pub nfd_summary: Vec<NfdEntry>,
    pub reliability: Reliability,
}

impl AnalyticsSnapshot {
    pub fn empty(generated_at: impl Into<String>) -> Self {
        Self {
            schema_version: ANALYTICS_SCHEMA_VERSION.to_string(),
            generated_at: generated_at.into(),
            has_events: false,
            totals: Totals::default(),
            ttm_per_lo: Vec::new(),
            elg_per_min: Vec::new(),
            confusion_edges: Vec::new(),
            speed_accuracy: SpeedAccuracy::default(),
            nfd_summary: Vec::new(),
            reliability: Reliability::default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub blueprint_loaded: bool,
    pub published_item_count: u64,
    pub analytics_present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics_generated_at: Option<String>,
}
