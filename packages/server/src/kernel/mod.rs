//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod dispatcher;
pub mod event_bus;
pub mod handler_log;
pub mod persistence;
pub mod scheduled_tasks;
pub mod unit_of_work;

pub use deps::ServerDeps;
pub use dispatcher::{Dispatcher, DomainEvent, EventHandler, EventSink};
pub use event_bus::{EventBus, Subscriber};
pub use handler_log::HandlerLog;
pub use scheduled_tasks::{start_scheduler, PruneSchedule};
pub use unit_of_work::{TxScope, UnitOfWork, UnitOfWorkFactory, WorkoutBus, WorkoutDispatcher};
