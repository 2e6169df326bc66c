//! Workout domain effects.
//!
//! Synchronous (inside the writer's transaction):
//!   the completion cascade, see [`cascade`].
//!
//! Asynchronous (after commit):
//!   WorkoutCompleted → workout.summary (terminal, at most once per event id)

pub mod cascade;
pub mod summary;

use std::sync::Arc;

use sqlx::PgPool;

use super::energy::EnergyEstimator;
use super::events::WorkoutEvent;
use crate::kernel::{WorkoutBus, WorkoutDispatcher};

pub use cascade::{completed_in, register_cascade};
pub use summary::{WorkoutSummarySubscriber, WORKOUT_SUMMARY_HANDLER};

/// Register every sync handler and async subscriber of the workout domain.
pub async fn register_workout_effects(
    dispatcher: &WorkoutDispatcher,
    bus: &WorkoutBus,
    pool: PgPool,
    estimator: Arc<EnergyEstimator>,
) {
    register_cascade(dispatcher, Arc::clone(&estimator)).await;
    bus.subscribe(
        WorkoutEvent::WORKOUT_COMPLETED,
        Arc::new(WorkoutSummarySubscriber::new(pool, estimator)),
    )
    .await;
}
