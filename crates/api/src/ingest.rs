//! Ingest pipeline guard, applied ahead of `/api/attempts` and
//! `/api/sessions`: bearer auth, then the body-size limit, then the
//! per-client rate-limit bucket, per spec §4.9's ordering.

use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;

use studyforge_domain::DomainError;

use crate::AppState;

struct Bucket {
    count: u32,
    window_start_ms: i64,
}

/// Fixed-window request counter keyed by client fingerprint, per spec §4.9.
/// Deliberately hand-rolled rather than `tower_governor`: the reset-at-`W`
/// semantics and header-derived fingerprint are bespoke to this spec.
pub struct RateLimiter {
    buckets: DashMap<String, Bucket>,
    window_ms: i64,
    max: u32,
}

impl RateLimiter {
    pub fn new(window_ms: u64, max: u32) -> Self {
        Self {
            buckets: DashMap::new(),
            window_ms: window_ms as i64,
            max,
        }
    }

    /// Returns `Ok(())` if `key` still has budget in its current window,
    /// else `Err(retry_after_secs)`.
    pub fn check(&self, key: &str, now_ms: i64) -> Result<(), u64> {
        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket {
                count: 0,
                window_start_ms: now_ms,
            });

        if now_ms - bucket.window_start_ms >= self.window_ms {
            bucket.window_start_ms = now_ms;
            bucket.count = 0;
        }

        if bucket.count >= self.max {
            let remaining_ms = (bucket.window_start_ms + self.window_ms - now_ms).max(0);
            return Err(((remaining_ms + 999) / 1000) as u64);
        }

        bucket.count += 1;
        Ok(())
    }
}

/// Client fingerprint per spec §4.9: first `X-Forwarded-For` entry, else
/// `X-Real-IP`, else `"unknown"`.
fn client_fingerprint(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        let first = forwarded.split(',').next().unwrap_or("").trim();
        if !first.is_empty() {
            return first.to_string();
        }
    }
    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }
    "unknown".to_string()
}

/// Auth, size-guard, and rate-limit middleware for the telemetry ingest
/// routes. Schema validation happens downstream in the handler, since it
/// requires a parsed body.
pub async fn ingest_guard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    req: Request,
    next: Next,
) -> Result<Response, DomainError> {
    if !state.config.ingest_token.is_empty() {
        let expected = format!("Bearer {}", state.config.ingest_token);
        let provided = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            return Err(DomainError::Unauthorized("missing or invalid ingest token".to_string()));
        }
    }

    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, state.config.ingest_max_bytes)
        .await
        .map_err(|_| DomainError::PayloadTooLarge)?;

    let fingerprint = client_fingerprint(&headers);
    let now_ms = Utc::now().timestamp_millis();
    if let Err(retry_after_secs) = state.rate_limiter.check(&fingerprint, now_ms) {
        return Err(DomainError::RateLimited { retry_after_secs });
    }

    let req = Request::from_parts(parts, Body::from(bytes));

    Ok(next.run(req).await)
}
