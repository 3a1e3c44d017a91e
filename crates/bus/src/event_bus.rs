//! Process-wide, single-threaded-cooperative event bus. `on` registers a
//! handler and returns an unsubscribe token; `emit` awaits every handler
//! for that event type sequentially, in registration order.

use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

type HandlerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type Handler = Arc<dyn Fn(Value) -> HandlerFuture + Send + Sync>;

struct Registration {
    id: u64,
    handler: Handler,
}

/// Opaque token returned by [`EventBus::on`]; dropping it does nothing —
/// call `unsubscribe()` explicitly, matching the teacher's explicit
/// cleanup style over implicit `Drop` magic.
pub struct Subscription {
    bus: EventBus,
    event_type: &'static str,
    id: u64,
}

impl Subscription {
    pub async fn unsubscribe(self) {
        let mut handlers = self.bus.handlers.lock().await;
        if let Some(list) = handlers.get_mut(self.event_type) {
            list.retain(|r| r.id != self.id);
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    handlers: Arc<Mutex<HashMap<&'static str, Vec<Registration>>>>,
    next_id: Arc<AtomicU64>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Register a handler for `event_type`. The handler receives the raw
    /// JSON payload and must tolerate additional unknown fields, per
    /// spec §4.8 — deserialize only the fields it needs.
    pub async fn on<F, Fut>(&self, event_type: &'static str, handler: F) -> Subscription
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let wrapped: Handler = Arc::new(move |value| Box::pin(handler(value)));

        let mut handlers = self.handlers.lock().await;
        handlers
            .entry(event_type)
            .or_default()
            .push(Registration { id, handler: wrapped });

        Subscription {
            bus: self.clone(),
            event_type,
            id,
        }
    }

    /// Serialize `payload` and invoke every handler registered for
    /// `event_type`, sequentially, in registration order. Returns once all
    /// handlers complete.
    pub async fn emit(&self, event_type: &'static str, payload: impl serde::Serialize) {
        let value = serde_json::to_value(payload).expect("event payloads always serialize");

        let snapshot: Vec<Handler> = {
            let handlers = self.handlers.lock().await;
            handlers
                .get(event_type)
                .map(|list| list.iter().map(|r| r.handler.clone()).collect())
                .unwrap_or_default()
        };

        for handler in snapshot {
            handler(value.clone()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Mutex as AsyncMutex;

    #[tokio::test]
    async fn handlers_run_sequentially_in_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(AsyncMutex::new(Vec::new()));

        let order_a = order.clone();
        bus.on("TEST_EVENT", move |_| {
            let order_a = order_a.clone();
            async move {
                order_a.lock().await.push("a");
            }
        })
        .await;

        let order_b = order.clone();
        bus.on("TEST_EVENT", move |_| {
            let order_b = order_b.clone();
            async move {
                order_b.lock().await.push("b");
            }
        })
        .await;

        bus.emit("TEST_EVENT", serde_json::json!({"x": 1})).await;

        assert_eq!(*order.lock().await, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn unsubscribed_handler_is_not_invoked() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = count.clone();
        let subscription = bus
            .on("TEST_EVENT", move |_| {
                let count_clone = count_clone.clone();
                async move {
                    count_clone.fetch_add(1, Ordering::SeqCst);
                }
            })
            .await;

        subscription.unsubscribe().await;
        bus.emit("TEST_EVENT", serde_json::json!({})).await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn emit_with_no_handlers_returns_immediately() {
        let bus = EventBus::new();
        bus.emit("NOBODY_LISTENING", serde_json::json!({})).await;
    }
}
