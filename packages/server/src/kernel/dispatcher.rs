//! Synchronous domain event dispatcher.
//!
//! Handlers run inside the caller's transaction, in registration order, and
//! may return follow-up events which are dispatched after the current batch.
//! The first handler error aborts dispatch; the caller's unit of work is then
//! dropped and everything it wrote rolls back.
//!
//! ```text
//! service ─► dispatch([SetStatusChanged])
//!              │
//!              ├─► record(event) into the unit of work
//!              ├─► handler A ─► [ExerciseStatusChanged] ─┐
//!              │                                         │
//!              ◄─────────────────── queued ◄─────────────┘
//! ```

use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::common::Result;

/// An event that can be routed by type name.
pub trait DomainEvent: Clone + Debug + Send + Sync + 'static {
    /// Stable type name used as the registry key and in the handler log.
    fn event_type(&self) -> &'static str;
}

/// Collects every dispatched event so it can be published after commit.
pub trait EventSink<E> {
    fn record(&mut self, event: E);
}

/// A transactional reaction to a domain event.
#[async_trait]
pub trait EventHandler<C, E>: Send + Sync {
    fn name(&self) -> &'static str;

    /// Handle one event, returning the events raised while doing so.
    async fn handle(&self, ctx: &mut C, event: &E) -> Result<Vec<E>>;
}

/// Registry of `{event type → handlers}`.
///
/// Written once at startup, read on every dispatch.
pub struct Dispatcher<C, E> {
    handlers: RwLock<HashMap<&'static str, Vec<Arc<dyn EventHandler<C, E>>>>>,
}

impl<C, E> Dispatcher<C, E>
where
    C: EventSink<E> + Send + 'static,
    E: DomainEvent,
{
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register(&self, event_type: &'static str, handler: Arc<dyn EventHandler<C, E>>) {
        debug!(event_type, handler = handler.name(), "Registering sync handler");
        self.handlers
            .write()
            .await
            .entry(event_type)
            .or_default()
            .push(handler);
    }

    pub async fn handler_count(&self, event_type: &str) -> usize {
        self.handlers
            .read()
            .await
            .get(event_type)
            .map_or(0, Vec::len)
    }

    /// Dispatch `events` and everything they cascade into.
    pub async fn dispatch(&self, ctx: &mut C, events: Vec<E>) -> Result<()> {
        let mut queue: VecDeque<E> = events.into();

        while let Some(event) = queue.pop_front() {
            let event_type = event.event_type();
            let handlers = self
                .handlers
                .read()
                .await
                .get(event_type)
                .cloned()
                .unwrap_or_default();

            ctx.record(event.clone());

            for handler in handlers {
                let raised = handler.handle(ctx, &event).await.map_err(|e| {
                    warn!(
                        event_type,
                        handler = handler.name(),
                        error = %e,
                        "Sync handler failed; aborting dispatch"
                    );
                    e
                })?;
                queue.extend(raised);
            }
        }

        Ok(())
    }
}

impl<C, E> Default for Dispatcher<C, E>
where
    C: EventSink<E> + Send + 'static,
    E: DomainEvent,
{
    fn default() -> Self {
        Self::new()
    }
}
