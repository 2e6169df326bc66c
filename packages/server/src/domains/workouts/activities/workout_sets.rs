use tracing::info;

use crate::common::{Required, Result, WorkoutSet as WorkoutSetMarker};
use crate::domains::workouts::data::{SetCompletion, WorkoutSetInput, WorkoutSetUpdate};
use crate::domains::workouts::effects::completed_in;
use crate::domains::workouts::models::{NewWorkoutSet, SetStatus, Workout, WorkoutExercise, WorkoutSet};
use crate::domains::workouts::summary::recompute_summary;
use crate::kernel::persistence::{
    decrement_indexes_after, insert_position, swap_by_index, WorkoutExercisePath, WorkoutSetPath,
};
use crate::kernel::ServerDeps;

use super::carry_over::prior_values;
use super::chain::lock_set_chain;
use super::moves::Direction;

/// Adds a pending set, planned from the slot's carry-over source at the
/// same position.
pub async fn create_workout_set(
    path: WorkoutExercisePath,
    input: &WorkoutSetInput,
    deps: &ServerDeps,
) -> Result<WorkoutSet> {
    input.validate()?;

    let mut uow = deps.unit_of_work.begin().await?;
    let mut exercise = lock_set_chain(&mut uow, &path).await?;

    let index = insert_position::<WorkoutSetMarker>(exercise.id, input.index, &mut uow).await?;
    let previous = prior_values(
        &mut uow,
        path.user_id,
        exercise.previous_exercise_id,
        index as usize,
    )
    .await?
    .pop()
    .unwrap_or_default();

    let new = NewWorkoutSet::builder()
        .workout_exercise_id(exercise.id)
        .index(index)
        .weight(input.weight)
        .reps(input.reps)
        .previous_weight(previous.weight)
        .previous_reps(previous.reps)
        .build();
    let set = WorkoutSet::insert(&new, &mut uow).await?;

    exercise.raise_status_changed(path.user_id);
    uow.dispatch(exercise.events.drain()).await?;

    let set = WorkoutSet::find(&path.set(set.id), &mut uow).await?;
    uow.commit().await?;
    Ok(set)
}

pub async fn get_workout_set(path: WorkoutSetPath, deps: &ServerDeps) -> Result<WorkoutSet> {
    let mut conn = deps.db_pool.acquire().await?;
    WorkoutSet::find(&path, &mut conn).await
}

/// Updates logged weight and reps. A completed workout gets its energy
/// summary recomputed.
pub async fn update_workout_set(
    path: WorkoutSetPath,
    input: &WorkoutSetUpdate,
    deps: &ServerDeps,
) -> Result<WorkoutSet> {
    input.validate()?;

    let mut uow = deps.unit_of_work.begin().await?;
    let exercise = lock_set_chain(&mut uow, &path.exercise()).await?;
    let set = WorkoutSet::update(&path, input.weight, input.reps, &mut uow).await?;

    let workout = Workout::find_by_id(exercise.workout_id, &mut uow)
        .await
        .required("workout")?;
    if workout.completed {
        recompute_summary(path.user_id, workout.id, &deps.estimator, &mut uow).await?;
    }

    uow.commit().await?;
    Ok(set)
}

/// Deletes a set and closes the gap in its slot's indexes.
pub async fn delete_workout_set(path: WorkoutSetPath, deps: &ServerDeps) -> Result<()> {
    info!(user_id = %path.user_id, set_id = %path.set_id, "Deleting workout set");

    let mut uow = deps.unit_of_work.begin().await?;
    let mut exercise = lock_set_chain(&mut uow, &path.exercise()).await?;

    let set = WorkoutSet::delete(&path, &mut uow).await?;
    decrement_indexes_after::<WorkoutSetMarker>(exercise.id, set.index, &mut uow).await?;

    exercise.raise_status_changed(path.user_id);
    uow.dispatch(exercise.events.drain()).await?;
    uow.commit().await?;
    Ok(())
}

pub async fn move_workout_set(
    path: WorkoutSetPath,
    direction: Direction,
    deps: &ServerDeps,
) -> Result<WorkoutSet> {
    let mut uow = deps.unit_of_work.begin().await?;
    let exercise = lock_set_chain(&mut uow, &path.exercise()).await?;

    let set = WorkoutSet::find(&path, &mut uow).await?;
    let target = direction.target(set.index)?;
    swap_by_index::<WorkoutSetMarker>(&mut uow, exercise.id, set.index, target).await?;

    let moved = WorkoutSet::find(&path, &mut uow).await?;
    uow.commit().await?;
    Ok(moved)
}

/// Writes the status of one set; every ancestor's flags follow through the
/// completion cascade.
pub async fn complete_workout_set(
    path: WorkoutSetPath,
    status: SetStatus,
    deps: &ServerDeps,
) -> Result<SetCompletion> {
    info!(
        user_id = %path.user_id,
        set_id = %path.set_id,
        status = ?status,
        "Completing workout set"
    );

    let mut uow = deps.unit_of_work.begin().await?;
    lock_set_chain(&mut uow, &path.exercise()).await?;

    let mut set = WorkoutSet::set_status(&path, status, &mut uow).await?;
    uow.dispatch(set.events.drain()).await?;

    let exercise = WorkoutExercise::find_by_id(set.workout_exercise_id, &mut uow)
        .await
        .required("workout exercise")?;
    let workout = Workout::find_by_id(exercise.workout_id, &mut uow)
        .await
        .required("workout")?;
    let energy = completed_in(&uow, workout.id)
        .then(|| workout.energy())
        .flatten();
    uow.commit().await?;

    Ok(SetCompletion {
        set,
        workout_exercise: exercise,
        workout,
        energy,
    })
}
