//! Transaction scope shared by every write path.
//!
//! A [`UnitOfWork`] owns one Postgres transaction plus the accumulator of
//! domain events dispatched inside it. Repositories receive it as a plain
//! `&mut PgConnection` through `DerefMut`, so they never know whether they are
//! running inside a larger operation.
//!
//! ```text
//! begin() ─► lock rows top-down ─► mutate ─► dispatch (cascade)
//!                                               │ record()
//!                                               ▼
//!                                       accumulated events
//! commit() ─► COMMIT ─► bus.publish(accumulated)
//! drop without commit ─► ROLLBACK, accumulator discarded
//! ```
//!
//! Cancellation is drop: if the owning task is cancelled before `commit`,
//! the transaction rolls back and nothing is published.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, warn};

use super::dispatcher::{Dispatcher, EventSink};
use super::event_bus::EventBus;
use super::persistence::Table;
use crate::common::Result;
use crate::domains::workouts::events::WorkoutEvent;

pub type WorkoutDispatcher = Dispatcher<UnitOfWork, WorkoutEvent>;
pub type WorkoutBus = EventBus<WorkoutEvent>;

/// Opens units of work.
#[derive(Clone)]
pub struct UnitOfWorkFactory {
    pool: PgPool,
    dispatcher: Arc<WorkoutDispatcher>,
    bus: WorkoutBus,
}

impl UnitOfWorkFactory {
    pub fn new(pool: PgPool, dispatcher: Arc<WorkoutDispatcher>, bus: WorkoutBus) -> Self {
        Self {
            pool,
            dispatcher,
            bus,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Always opens a new transaction.
    ///
    /// Only public use cases call this; code that already holds a
    /// `&mut UnitOfWork` joins it instead, so transactions never nest.
    pub async fn begin(&self) -> Result<UnitOfWork> {
        let tx = self.pool.begin().await?;
        Ok(UnitOfWork {
            tx,
            accumulated: Vec::new(),
            dispatcher: Arc::clone(&self.dispatcher),
            bus: self.bus.clone(),
            deepest_lock: None,
        })
    }

    /// Joins `ambient` when present, otherwise opens a new transaction.
    pub async fn join_or_begin<'a>(&self, ambient: Option<&'a mut UnitOfWork>) -> Result<TxScope<'a>> {
        match ambient {
            Some(uow) => Ok(TxScope::Joined(uow)),
            None => Ok(TxScope::Owned(self.begin().await?)),
        }
    }
}

/// One transaction and the events raised inside it.
///
/// Dropping it without [`UnitOfWork::commit`] rolls back and publishes nothing.
pub struct UnitOfWork {
    tx: Transaction<'static, Postgres>,
    accumulated: Vec<WorkoutEvent>,
    dispatcher: Arc<WorkoutDispatcher>,
    bus: WorkoutBus,
    deepest_lock: Option<Table>,
}

impl UnitOfWork {
    /// Run the synchronous cascade for `events` inside this transaction.
    pub async fn dispatch(&mut self, events: Vec<WorkoutEvent>) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        let dispatcher = Arc::clone(&self.dispatcher);
        dispatcher.dispatch(self, events).await
    }

    /// Events accumulated so far, in dispatch order.
    pub fn accumulated(&self) -> &[WorkoutEvent] {
        &self.accumulated
    }

    /// Notes an explicit row lock on `table`.
    ///
    /// Locks must be taken top-down (plans → cycles → workouts → workout
    /// exercises → individual exercises → sets). Going back up is logged.
    pub(crate) fn note_lock(&mut self, table: Table) {
        if let Some(deepest) = self.deepest_lock {
            if table < deepest {
                warn!(
                    locked = table.as_str(),
                    after = deepest.as_str(),
                    "Row lock taken out of order"
                );
                return;
            }
        }
        self.deepest_lock = Some(table);
    }

    /// Commit, then hand the accumulated events to the async bus.
    ///
    /// Returns the published events.
    pub async fn commit(self) -> Result<Vec<WorkoutEvent>> {
        let Self {
            tx,
            accumulated,
            bus,
            ..
        } = self;

        tx.commit().await?;
        debug!(events = accumulated.len(), "Unit of work committed");

        if !accumulated.is_empty() {
            bus.publish(&accumulated).await;
        }
        Ok(accumulated)
    }
}

impl EventSink<WorkoutEvent> for UnitOfWork {
    fn record(&mut self, event: WorkoutEvent) {
        self.accumulated.push(event);
    }
}

impl Deref for UnitOfWork {
    type Target = PgConnection;

    fn deref(&self) -> &PgConnection {
        &self.tx
    }
}

impl DerefMut for UnitOfWork {
    fn deref_mut(&mut self) -> &mut PgConnection {
        &mut self.tx
    }
}

/// A unit of work that is either borrowed from the caller or owned here.
pub enum TxScope<'a> {
    Joined(&'a mut UnitOfWork),
    Owned(UnitOfWork),
}

impl TxScope<'_> {
    pub fn uow(&mut self) -> &mut UnitOfWork {
        match self {
            Self::Joined(uow) => uow,
            Self::Owned(uow) => uow,
        }
    }

    /// Commits when this scope opened the transaction; a joined scope leaves
    /// that to its owner.
    pub async fn finish(self) -> Result<()> {
        match self {
            Self::Joined(_) => Ok(()),
            Self::Owned(uow) => uow.commit().await.map(|_| ()),
        }
    }
}
