//! In-process topic bus for post-commit reactions.
//!
//! # Guarantees
//!
//! - **After commit only**: the unit of work publishes once its transaction
//!   has committed; a rolled-back unit of work publishes nothing.
//! - **Sequential**: subscribers run one after another in the publisher's task.
//! - **Failures are contained**: a subscriber error is logged and the next
//!   subscriber still runs. Committed state is never reversed.
//!
//! Subscribers that must not repeat side effects wrap their work in
//! [`HandlerLog::try_process`](super::handler_log::HandlerLog::try_process).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, error};

use super::dispatcher::DomainEvent;

/// A post-commit reaction to a published event.
#[async_trait]
pub trait Subscriber<E>: Send + Sync {
    /// Stable name, also used as the handler key in the idempotency log.
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &E) -> anyhow::Result<()>;
}

/// Cloneable handle to the subscriber registry.
pub struct EventBus<E> {
    subscribers: Arc<RwLock<HashMap<&'static str, Vec<Arc<dyn Subscriber<E>>>>>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

impl<E: DomainEvent> EventBus<E> {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn subscribe(&self, event_type: &'static str, subscriber: Arc<dyn Subscriber<E>>) {
        debug!(event_type, subscriber = subscriber.name(), "Subscribing async handler");
        self.subscribers
            .write()
            .await
            .entry(event_type)
            .or_default()
            .push(subscriber);
    }

    /// Deliver `events` to their subscribers. Returns the number of
    /// subscriber invocations that succeeded.
    pub async fn publish(&self, events: &[E]) -> usize {
        let mut delivered = 0;

        for event in events {
            let event_type = event.event_type();
            let subscribers = self
                .subscribers
                .read()
                .await
                .get(event_type)
                .cloned()
                .unwrap_or_default();

            for subscriber in subscribers {
                match subscriber.handle(event).await {
                    Ok(()) => delivered += 1,
                    Err(e) => error!(
                        event_type,
                        subscriber = subscriber.name(),
                        error = %e,
                        "Async handler failed"
                    ),
                }
            }
        }

        delivered
    }
}

impl<E: DomainEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").finish_non_exhaustive()
    }
}
