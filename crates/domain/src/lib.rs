//! Domain types for studyforge: item bank, learner state, telemetry events,
//! analytics snapshot, and the HTTP error taxonomy.

pub mod analytics;
pub mod errors;
pub mod evidence;
pub mod events;
pub mod item;
pub mod learner;

pub use analytics::*;
pub use errors::*;
pub use evidence::*;
pub use events::*;
pub use item::*;
pub use learner::*;

/// Readiness response; this system has no external database to report on
/// separately from process health.
#[derive(Debug, serde::Serialize)]
pub struct ReadyResponse {
    pub status: String,
}
