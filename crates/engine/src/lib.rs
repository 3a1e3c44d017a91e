//! Deterministic adaptive-engine primitives: psychometrics, selection,
//! scheduling, retention, blueprint assembly, and retrieval. Every public
//! function here is pure and CPU-only; the only state that persists across
//! calls is whatever the caller threads through explicitly.

pub mod blueprint;
pub mod personalization;
pub mod psychometrics;
pub mod retention;
pub mod retrieval;
pub mod rng;
pub mod scheduler;
pub mod selector;

pub use blueprint::{build_form_greedy, derive_lo_targets, is_blueprint_feasible, BlueprintDeficit, BuildFormInput, LoDeficit};
pub use personalization::{PersonalizationEngine, RetentionBudget, StopDecision, UpdateSignals};
pub use psychometrics::{
    eap_update, elo_to_theta, gpcm_pmf, info, mastery_probability, p_correct, EapInput, EapOutput, Response,
};
pub use retention::{
    build_retention_queue, retention_budget, schedule_next_review, update_half_life, CappedExposure,
    ExposurePolicy, ExposureSignals, HalfLifeUpdate, IdentityExposure, QueuedCard,
};
pub use retrieval::{cosine_similarity, embed, search, temporal_decay, SearchQuery};
pub use scheduler::{blueprint_multiplier, schedule_next_lo, Arm, ScheduleResult};
pub use selector::{select, CandidateItem, ExposureWindow, Selection, SelectorInput};
