//! Top-down locks shared by the workout use cases.
//!
//! Any write below a workout takes cycle → workout (→ workout exercise), so
//! every cascade that can reach the same cycle runs one at a time.
//!
//! Slots sharing an individual exercise can live in different cycles. The
//! cascade moves that exercise's carry-over pointer after the set writes, so
//! set writers lock the exercise row with the slot, ahead of any set.

use crate::common::Result;
use crate::domains::workouts::models::{Workout, WorkoutExercise};
use crate::kernel::persistence::{
    get_for_update, lock_for_update, lock_ids_in_order, Table, WorkoutExercisePath, WorkoutPath,
};
use crate::kernel::UnitOfWork;

pub(crate) async fn lock_workout_chain(uow: &mut UnitOfWork, path: &WorkoutPath) -> Result<Workout> {
    lock_for_update(uow, &path.cycle()).await?;
    get_for_update(uow, path).await
}

pub(crate) async fn lock_exercise_chain(
    uow: &mut UnitOfWork,
    path: &WorkoutExercisePath,
) -> Result<WorkoutExercise> {
    lock_for_update(uow, &path.cycle()).await?;
    lock_for_update(uow, &path.workout()).await?;
    get_for_update(uow, path).await
}

/// [`lock_exercise_chain`] plus the slot's individual exercise, for paths
/// that write sets.
pub(crate) async fn lock_set_chain(
    uow: &mut UnitOfWork,
    path: &WorkoutExercisePath,
) -> Result<WorkoutExercise> {
    let exercise = lock_exercise_chain(uow, path).await?;
    lock_ids_in_order(
        uow,
        Table::IndividualExercises,
        &[exercise.individual_exercise_id.value()],
    )
    .await?;
    Ok(exercise)
}
