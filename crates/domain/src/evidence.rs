//! Evidence chunks backing the deterministic `/api/search` retrieval lane.

use serde::{Deserialize, Serialize};

/// A citable slice of source material, indexed by a deterministic embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceChunk {
    pub item_id: String,
    pub lo_ids: Vec<String>,
    pub source_file: String,
    pub page: u32,
    pub version: String,
    pub ts: i64,
    pub text: String,
    pub embedding: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub item_id: String,
    pub lo_ids: Vec<String>,
    pub source_file: String,
    pub page: u32,
    pub text: String,
    pub score: f64,
}
