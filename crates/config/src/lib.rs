//! Configuration for the studyforge engine and its HTTP surface.
//!
//! Every environment variable the system recognizes is collected into a
//! single immutable [`AppConfig`] at startup, rather than read ad hoc
//! throughout the codebase.

use serde::Deserialize;
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Address to bind the HTTP server to.
    pub bind_address: String,
    /// Engine's declared schema version; attempt/session events must match exactly.
    pub schema_version: String,
    /// Disables NDJSON telemetry append when `"0"` or `"false"`. Enabled by default.
    pub write_telemetry: bool,
    /// Bearer token required on ingest endpoints. Empty disables auth.
    pub ingest_token: String,
    /// Rate-limit window, in milliseconds.
    pub ingest_window_ms: u64,
    /// Max requests per client fingerprint per window.
    pub ingest_window_max: u32,
    /// Max accepted request body size, in bytes.
    pub ingest_max_bytes: usize,
    /// Path to `config/blueprint.json`.
    pub blueprint_path: String,
    /// Path to the learning-objective catalog.
    pub los_path: String,
    /// Content-bank directories to scan for `*.item.json` files.
    pub scope_dirs: Vec<String>,
    /// Where the analyzer writes its snapshot.
    pub analytics_out_path: String,
    /// Directory holding per-learner state documents and the event NDJSON log.
    pub study_state_dir: String,
    /// Path to the evidence-chunk catalog backing `/api/search`.
    pub evidence_path: String,
    /// Enables mirroring ingest writes to an external table store.
    pub use_supabase_ingest: bool,
    pub supabase_url: Option<String>,
    pub supabase_service_role_key: Option<String>,
    /// Request-scoped deadline applied to every HTTP handler, in milliseconds.
    pub request_timeout_ms: u64,
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// documented defaults for everything but nothing that must be
    /// explicitly opted into (e.g. Supabase credentials).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            bind_address: env_var_or("BIND_ADDRESS", "0.0.0.0:8080"),
            schema_version: env_var_or("SCHEMA_VERSION", "1.1.0"),
            write_telemetry: !matches!(
                env_var_or("WRITE_TELEMETRY", "1").as_str(),
                "0" | "false"
            ),
            ingest_token: env_var_or("INGEST_TOKEN", ""),
            ingest_window_ms: env_u64_or("INGEST_WINDOW_MS", 60_000)?,
            ingest_window_max: env_u32_or("INGEST_WINDOW_MAX", 60)?,
            ingest_max_bytes: env_usize_or("INGEST_MAX_BYTES", 10 * 1024)?,
            blueprint_path: env_var_or("BLUEPRINT_PATH", "config/blueprint.json"),
            los_path: env_var_or("LOS_PATH", "config/los.json"),
            scope_dirs: env_var_or("SCOPE_DIRS", "content/banks")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            analytics_out_path: env_var_or(
                "ANALYTICS_OUT_PATH",
                "public/analytics/latest.json",
            ),
            study_state_dir: env_var_or("STUDY_STATE_DIR", "data/learners"),
            evidence_path: env_var_or("EVIDENCE_PATH", "content/evidence.json"),
            use_supabase_ingest: matches!(
                env_var_or("USE_SUPABASE_INGEST", "0").as_str(),
                "1" | "true"
            ),
            supabase_url: env::var("SUPABASE_URL").ok(),
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY").ok(),
            request_timeout_ms: env_u64_or("REQUEST_TIMEOUT_MS", 10_000)?,
        })
    }
}

fn env_var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_u64_or(name: &str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(v) => v
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string(), v)),
        Err(_) => Ok(default),
    }
}

fn env_u32_or(name: &str, default: u32) -> Result<u32, ConfigError> {
    match env::var(name) {
        Ok(v) => v
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string(), v)),
        Err(_) => Ok(default),
    }
}

fn env_usize_or(name: &str, default: usize) -> Result<usize, ConfigError> {
    match env::var(name) {
        Ok(v) => v
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string(), v)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_or_uses_default() {
        let val = env_var_or("NON_EXISTENT_VAR_12345", "default_value");
        assert_eq!(val, "default_value");
    }

    #[test]
    fn write_telemetry_disabled_by_explicit_false() {
        unsafe {
            env::set_var("WRITE_TELEMETRY", "false");
        }
        let config = AppConfig::from_env().unwrap();
        assert!(!config.write_telemetry);
        unsafe {
            env::remove_var("WRITE_TELEMETRY");
        }
    }

    #[test]
    fn scope_dirs_splits_on_comma_and_trims() {
        unsafe {
            env::set_var("SCOPE_DIRS", "content/banks/a, content/banks/b ,");
        }
        let config = AppConfig::from_env().unwrap();
        assert_eq!(
            config.scope_dirs,
            vec!["content/banks/a".to_string(), "content/banks/b".to_string()]
        );
        unsafe {
            env::remove_var("SCOPE_DIRS");
        }
    }
}
