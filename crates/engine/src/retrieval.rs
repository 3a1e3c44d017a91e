//! Retention/search helpers: deterministic hash-based embedding, cosine
//! similarity, temporal half-life decay, and the LO-match boost used by
//! `/api/search`.

use chrono::{DateTime, TimeZone, Utc};
use studyforge_domain::{EvidenceChunk, SearchHit};

const EMBEDDING_DIMS: usize = 32;
const DECAY_HALF_LIFE_DAYS: f64 = 90.0;
const LO_MATCH_BOOST: f64 = 0.05;

/// Stable FNV-1a-style hash-to-vector embedding: every token contributes a
/// deterministic nudge to one dimension, keyed by its hash. No ML model,
/// no randomness — same text always yields the same vector.
pub fn embed(text: &str) -> Vec<f64> {
    let mut vector = vec![0.0f64; EMBEDDING_DIMS];
    for token in text.split_whitespace() {
        let hash = fnv1a(token.to_lowercase().as_bytes());
        let dim = (hash as usize) % EMBEDDING_DIMS;
        let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
        vector[dim] += sign;
    }
    normalize(vector)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn normalize(vector: Vec<f64>) -> Vec<f64> {
    let norm: f64 = vector.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm <= 1e-9 {
        return vector;
    }
    vector.into_iter().map(|x| x / norm).collect()
}

pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a <= 1e-9 || norm_b <= 1e-9 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// `exp(-ln2 * deltaDays/90)`.
pub fn temporal_decay(chunk_ts_ms: i64, now_ms: i64) -> f64 {
    let delta_days = ((now_ms - chunk_ts_ms).max(0) as f64) / 86_400_000.0;
    (-std::f64::consts::LN_2 * delta_days / DECAY_HALF_LIFE_DAYS).exp()
}

pub struct SearchQuery<'a> {
    pub text: &'a str,
    pub lo_ids: &'a [String],
    pub since_ms: Option<i64>,
    pub k: usize,
    pub now_ms: i64,
}

/// Rank evidence chunks by cosine similarity to the query embedding, scaled
/// by temporal decay and boosted per overlapping LO, returning the top-K.
pub fn search(query: &SearchQuery, chunks: &[EvidenceChunk]) -> Vec<SearchHit> {
    let query_embedding = embed(query.text);

    let mut hits: Vec<SearchHit> = chunks
        .iter()
        .filter(|chunk| query.since_ms.is_none_or(|since| chunk.ts >= since))
        .map(|chunk| {
            let similarity = cosine_similarity(&query_embedding, &chunk.embedding);
            let decay = temporal_decay(chunk.ts, query.now_ms);
            let overlap = chunk
                .lo_ids
                .iter()
                .filter(|lo| query.lo_ids.contains(lo))
                .count();
            let score = similarity * decay + overlap as f64 * LO_MATCH_BOOST;
            SearchHit {
                item_id: chunk.item_id.clone(),
                lo_ids: chunk.lo_ids.clone(),
                source_file: chunk.source_file.clone(),
                page: chunk.page,
                text: chunk.text.clone(),
                score,
            }
        })
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    hits.truncate(query.k);
    hits
}

/// ISO-8601 rendering of a millisecond epoch timestamp, used to stamp
/// `LearnerState::updated_at`.
pub fn iso8601_millis(ts_ms: i64) -> String {
    let datetime: DateTime<Utc> = Utc
        .timestamp_millis_opt(ts_ms)
        .single()
        .unwrap_or_else(Utc::now);
    datetime.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
