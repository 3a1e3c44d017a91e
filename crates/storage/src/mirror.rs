//! Optional external-table mirror: projects ingested attempt/session
//! events into an external table store (Supabase/PostgREST by default).
//! Mirror failures are logged and never roll back the locally-committed
//! learner-state update — see the Open Question decision in DESIGN.md.

use crate::error::StorageError;
use async_trait::async_trait;
use studyforge_domain::{AttemptEvent, SessionEvent};

#[async_trait]
pub trait ExternalMirror: Send + Sync {
    async fn mirror_attempt(&self, event: &AttemptEvent) -> Result<(), StorageError>;
    async fn mirror_session(&self, event: &SessionEvent) -> Result<(), StorageError>;
}

/// No-op mirror used when `USE_SUPABASE_INGEST` is unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMirror;

#[async_trait]
impl ExternalMirror for NoopMirror {
    async fn mirror_attempt(&self, _event: &AttemptEvent) -> Result<(), StorageError> {
        Ok(())
    }

    async fn mirror_session(&self, _event: &SessionEvent) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Mirrors rows into a Supabase (PostgREST) table via its REST interface,
/// using the service-role key for row-level-security bypass.
pub struct SupabaseMirror {
    client: reqwest::Client,
    base_url: String,
    service_role_key: String,
}

impl SupabaseMirror {
    pub fn new(base_url: impl Into<String>, service_role_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            service_role_key: service_role_key.into(),
        }
    }

    async fn insert_row(&self, table: &str, body: &impl serde::Serialize) -> Result<(), StorageError> {
        let url = format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_role_key)
            .header("apikey", &self.service_role_key)
            .header("Prefer", "return=minimal")
            .json(body)
            .send()
            .await
            .map_err(|err| StorageError::Mirror(err.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::Mirror(format!(
                "supabase insert into {table} failed with status {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl ExternalMirror for SupabaseMirror {
    async fn mirror_attempt(&self, event: &AttemptEvent) -> Result<(), StorageError> {
        self.insert_row("attempts", event).await
    }

    async fn mirror_session(&self, event: &SessionEvent) -> Result<(), StorageError> {
        self.insert_row("sessions", event).await
    }
}
