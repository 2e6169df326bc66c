//! Completion cascade - synchronous handlers run inside the writer's transaction.
//!
//! Cascade flow:
//!   WorkoutSetStatusChanged      → derive workout exercise flags (+ carry-over pointer)
//!                                → WorkoutExerciseStatusChanged
//!   WorkoutExerciseStatusChanged → derive workout flags → WorkoutStatusChanged
//!   WorkoutStatusChanged         → persist workout flags
//!                                  (completed: stamp date, estimate, WorkoutCompleted)
//!                                → WorkoutCycleStatusChanged
//!   WorkoutCycleStatusChanged    → derive cycle flags (terminal)
//!
//! Every step recomputes from child counts, so repeated delivery converges
//! on the same state.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::common::{
    Result, WorkoutExercise as WorkoutExerciseMarker, WorkoutId, Workout as WorkoutMarker,
    WorkoutSet as WorkoutSetMarker,
};
use crate::domains::exercises::IndividualExercise;
use crate::domains::workouts::energy::EnergyEstimator;
use crate::domains::workouts::events::WorkoutEvent;
use crate::domains::workouts::models::{CompletionFlags, Workout, WorkoutCycle, WorkoutExercise};
use crate::domains::workouts::summary::recompute_summary;
use crate::kernel::persistence::status_counts;
use crate::kernel::{EventHandler, UnitOfWork, WorkoutDispatcher};

/// Register the completion cascade.
pub async fn register_cascade(dispatcher: &WorkoutDispatcher, estimator: Arc<EnergyEstimator>) {
    dispatcher
        .register(WorkoutEvent::SET_STATUS_CHANGED, Arc::new(ExerciseRollup))
        .await;
    dispatcher
        .register(WorkoutEvent::EXERCISE_STATUS_CHANGED, Arc::new(WorkoutRollup))
        .await;
    dispatcher
        .register(
            WorkoutEvent::WORKOUT_STATUS_CHANGED,
            Arc::new(WorkoutStatusWriter::new(estimator)),
        )
        .await;
    dispatcher
        .register(WorkoutEvent::CYCLE_STATUS_CHANGED, Arc::new(CycleRollup))
        .await;
}

// =============================================================================
// Set → workout exercise
// =============================================================================

pub struct ExerciseRollup;

#[async_trait]
impl EventHandler<UnitOfWork, WorkoutEvent> for ExerciseRollup {
    fn name(&self) -> &'static str {
        "cascade.workout_exercise"
    }

    async fn handle(&self, uow: &mut UnitOfWork, event: &WorkoutEvent) -> Result<Vec<WorkoutEvent>> {
        let WorkoutEvent::WorkoutSetStatusChanged {
            user_id,
            workout_exercise_id,
        } = event
        else {
            return Ok(vec![]);
        };

        let Some(mut exercise) = WorkoutExercise::find_by_id(*workout_exercise_id, uow).await? else {
            debug!(workout_exercise_id = %workout_exercise_id, "Workout exercise gone, nothing to derive");
            return Ok(vec![]);
        };

        let counts = status_counts::<WorkoutSetMarker>(exercise.id, uow).await?;
        let before = exercise.flags();
        let after = CompletionFlags::derive(&counts);

        if before != after {
            exercise = WorkoutExercise::set_flags(exercise.id, after, uow).await?;
            update_carry_over_pointer(&exercise, before, after, uow).await?;
            debug!(
                workout_exercise_id = %exercise.id,
                completed = after.completed,
                skipped = after.skipped,
                "Workout exercise flags derived"
            );
        }

        exercise.raise_membership_changed(*user_id);
        Ok(exercise.events.drain())
    }
}

/// Keeps `last_completed_workout_exercise_id` on the most recent performed slot.
async fn update_carry_over_pointer(
    exercise: &WorkoutExercise,
    before: CompletionFlags,
    after: CompletionFlags,
    uow: &mut UnitOfWork,
) -> Result<()> {
    if after.performed() {
        IndividualExercise::set_last_completed(exercise.individual_exercise_id, exercise.id, uow)
            .await?;
    } else if before.performed() {
        IndividualExercise::rewind_last_completed(
            exercise.individual_exercise_id,
            exercise.id,
            exercise.previous_exercise_id,
            uow,
        )
        .await?;
    }
    Ok(())
}

// =============================================================================
// Workout exercise → workout
// =============================================================================

pub struct WorkoutRollup;

#[async_trait]
impl EventHandler<UnitOfWork, WorkoutEvent> for WorkoutRollup {
    fn name(&self) -> &'static str {
        "cascade.workout"
    }

    async fn handle(&self, uow: &mut UnitOfWork, event: &WorkoutEvent) -> Result<Vec<WorkoutEvent>> {
        let WorkoutEvent::WorkoutExerciseStatusChanged {
            user_id,
            workout_id,
        } = event
        else {
            return Ok(vec![]);
        };

        let counts = status_counts::<WorkoutExerciseMarker>(*workout_id, uow).await?;
        let flags = CompletionFlags::derive(&counts);

        Ok(vec![WorkoutEvent::WorkoutStatusChanged {
            user_id: *user_id,
            workout_id: *workout_id,
            completed: flags.completed,
            skipped: flags.skipped,
        }])
    }
}

// =============================================================================
// Workout flags → persisted, completion side effects
// =============================================================================

pub struct WorkoutStatusWriter {
    estimator: Arc<EnergyEstimator>,
}

impl WorkoutStatusWriter {
    pub fn new(estimator: Arc<EnergyEstimator>) -> Self {
        Self { estimator }
    }
}

#[async_trait]
impl EventHandler<UnitOfWork, WorkoutEvent> for WorkoutStatusWriter {
    fn name(&self) -> &'static str {
        "cascade.workout_status"
    }

    async fn handle(&self, uow: &mut UnitOfWork, event: &WorkoutEvent) -> Result<Vec<WorkoutEvent>> {
        let WorkoutEvent::WorkoutStatusChanged {
            user_id,
            workout_id,
            completed,
            skipped,
        } = event
        else {
            return Ok(vec![]);
        };
        let flags = CompletionFlags::of(*completed, *skipped);

        let Some(current) = Workout::find_by_id(*workout_id, uow).await? else {
            return Ok(vec![]);
        };
        if current.flags() == flags {
            return Ok(vec![]);
        }

        let Some(transition) = Workout::apply_status(*workout_id, flags, uow).await? else {
            return Ok(vec![]);
        };
        let mut workout = transition.workout.clone();
        let mut raised = Vec::new();

        if transition.became_completed() {
            let estimate = recompute_summary(*user_id, *workout_id, &self.estimator, uow).await?;
            info!(
                user_id = %user_id,
                workout_id = %workout_id,
                calories = estimate.calories,
                "Workout completed"
            );
            raised.push(WorkoutEvent::workout_completed(
                *user_id,
                *workout_id,
                transition.previously_completed_at.is_none(),
            ));
        }

        workout.raise_membership_changed(*user_id);
        raised.extend(workout.events.drain());
        Ok(raised)
    }
}

// =============================================================================
// Workout → cycle
// =============================================================================

pub struct CycleRollup;

#[async_trait]
impl EventHandler<UnitOfWork, WorkoutEvent> for CycleRollup {
    fn name(&self) -> &'static str {
        "cascade.workout_cycle"
    }

    async fn handle(&self, uow: &mut UnitOfWork, event: &WorkoutEvent) -> Result<Vec<WorkoutEvent>> {
        let WorkoutEvent::WorkoutCycleStatusChanged { cycle_id, .. } = event else {
            return Ok(vec![]);
        };

        let cycle = WorkoutCycle::find_by_id(*cycle_id, uow).await?;
        let counts = status_counts::<WorkoutMarker>(*cycle_id, uow).await?;
        let flags = CompletionFlags::derive(&counts);

        if cycle.flags() != flags {
            WorkoutCycle::set_flags(*cycle_id, flags, uow).await?;
            debug!(
                cycle_id = %cycle_id,
                completed = flags.completed,
                skipped = flags.skipped,
                "Cycle flags derived"
            );
        }
        Ok(vec![])
    }
}

/// Whether `workout_id` completed inside this unit of work.
pub fn completed_in(uow: &UnitOfWork, workout_id: WorkoutId) -> bool {
    uow.accumulated().iter().any(|event| {
        matches!(
            event,
            WorkoutEvent::WorkoutCompleted { workout_id: id, .. } if *id == workout_id
        )
    })
}
