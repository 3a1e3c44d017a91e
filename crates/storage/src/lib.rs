//! Storage layer: per-learner state persistence, NDJSON telemetry log,
//! read-only content loaders, and the optional external-table mirror.

pub mod content;
pub mod error;
pub mod event_log;
pub mod learner_store;
pub mod mirror;

pub use content::{load_blueprint, load_evidence_chunks, load_item_bank, load_learning_objectives};
pub use error::StorageError;
pub use event_log::EventLog;
pub use learner_store::{sanitize_filename, JsonFileLearnerStore, LearnerStore};
pub use mirror::{ExternalMirror, NoopMirror, SupabaseMirror};
