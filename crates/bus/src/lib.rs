//! In-process event bus and the services that subscribe to it. Per spec
//! §9's redesign note on cyclic references, neither service owns the bus:
//! construction happens once, here, in [`wire_services`].

pub mod event_bus;
pub mod lesson_service;
pub mod state_service;

pub use event_bus::{EventBus, Subscription};
pub use lesson_service::{LessonService, SaveLessonRequestedPayload, LESSON_CREATED, SAVE_LESSON_REQUESTED};
pub use state_service::{AnswerSubmittedPayload, StateService, ANSWER_SUBMITTED, STATE_UPDATED};

use std::path::PathBuf;
use std::sync::Arc;
use studyforge_engine::PersonalizationEngine;
use studyforge_storage::LearnerStore;

/// Everything `wire_services` hands back to the caller: the bus plus live
/// subscriptions, kept alive for the process lifetime.
pub struct Wiring {
    pub bus: EventBus,
    _state_subscription: Subscription,
    _lesson_subscription: Subscription,
}

/// Single construction point for the bus and its services, called once
/// from the HTTP server's startup — never a module-level singleton.
pub async fn wire_services(
    store: Arc<dyn LearnerStore>,
    engine: PersonalizationEngine,
    snapshot_log_dir: impl Into<PathBuf>,
    lesson_storage_dir: impl Into<PathBuf>,
) -> Wiring {
    let bus = EventBus::new();

    let state_service = Arc::new(StateService::new(store, engine, snapshot_log_dir));
    let state_subscription = state_service::subscribe(&bus, state_service).await;

    let lesson_service = Arc::new(LessonService::new(lesson_storage_dir));
    let lesson_subscription = lesson_service::subscribe(&bus, lesson_service).await;

    Wiring {
        bus,
        _state_subscription: state_subscription,
        _lesson_subscription: lesson_subscription,
    }
}
