use tracing::info;

use crate::common::{Result, Workout as WorkoutMarker, WorkoutError};
use crate::domains::exercises::IndividualExercise;
use crate::domains::workouts::data::{required_name, WorkoutDetails, WorkoutInput, WorkoutUpdate};
use crate::domains::workouts::models::{NewWorkout, Workout, WorkoutCycle, WorkoutExercise};
use crate::kernel::persistence::{
    decrement_indexes_after, get_for_update, insert_position, lock_for_update, swap_by_index,
    CyclePath, WorkoutPath,
};
use crate::kernel::ServerDeps;

use super::moves::Direction;
use super::workout_exercises::load_exercise_details;

/// Adds a workout to a cycle. See [`WorkoutInput::index`] for placement.
pub async fn create_workout(
    path: CyclePath,
    input: &WorkoutInput,
    deps: &ServerDeps,
) -> Result<Workout> {
    let mut created = create_workouts(path, std::slice::from_ref(input), deps).await?;
    created
        .pop()
        .ok_or_else(|| WorkoutError::validation("no workout created"))
}

/// Adds several workouts to a cycle in one transaction, in input order.
pub async fn create_multiple_workouts(
    path: CyclePath,
    inputs: &[WorkoutInput],
    deps: &ServerDeps,
) -> Result<Vec<Workout>> {
    if inputs.is_empty() {
        return Err(WorkoutError::validation("at least one workout is required"));
    }
    create_workouts(path, inputs, deps).await
}

async fn create_workouts(
    path: CyclePath,
    inputs: &[WorkoutInput],
    deps: &ServerDeps,
) -> Result<Vec<Workout>> {
    let names = inputs
        .iter()
        .map(|input| required_name(&input.name, "workout name"))
        .collect::<Result<Vec<_>>>()?;
    info!(
        user_id = %path.user_id,
        cycle_id = %path.cycle_id,
        count = inputs.len(),
        "Creating workouts"
    );

    let mut uow = deps.unit_of_work.begin().await?;
    let mut cycle: WorkoutCycle = get_for_update(&mut uow, &path).await?;

    let mut created = Vec::with_capacity(inputs.len());
    for (input, name) in inputs.iter().zip(names) {
        let index = insert_position::<WorkoutMarker>(cycle.id, input.index, &mut uow).await?;
        let new = NewWorkout::builder()
            .workout_cycle_id(cycle.id)
            .name(name)
            .index(index)
            .date(input.date)
            .build();
        created.push(Workout::insert(&new, &mut uow).await?);
    }

    cycle.raise_status_changed(path.user_id);
    uow.dispatch(cycle.events.drain()).await?;

    // Inserting in the middle shifted earlier rows of this batch
    let mut workouts = Vec::with_capacity(created.len());
    for workout in created {
        workouts.push(Workout::find(&path.workout(workout.id), &mut uow).await?);
    }
    uow.commit().await?;
    Ok(workouts)
}

/// Workout with its exercises (ordered by index) and their sets.
pub async fn get_workout(path: WorkoutPath, deps: &ServerDeps) -> Result<WorkoutDetails> {
    let mut conn = deps.db_pool.acquire().await?;
    let workout = Workout::find(&path, &mut conn).await?;

    let mut exercises = Vec::new();
    for exercise in WorkoutExercise::find_by_workout(workout.id, &mut conn).await? {
        exercises.push(load_exercise_details(path.user_id, exercise, &mut conn).await?);
    }
    Ok(WorkoutDetails { workout, exercises })
}

pub async fn update_workout(
    path: WorkoutPath,
    input: &WorkoutUpdate,
    deps: &ServerDeps,
) -> Result<Workout> {
    let name = input
        .name
        .as_deref()
        .map(|name| required_name(name, "workout name"))
        .transpose()?;

    let mut conn = deps.db_pool.acquire().await?;
    Workout::update(&path, name, input.date, &mut conn).await
}

/// Deletes a workout and closes the gap in its cycle's indexes.
pub async fn delete_workout(path: WorkoutPath, deps: &ServerDeps) -> Result<()> {
    info!(user_id = %path.user_id, workout_id = %path.workout_id, "Deleting workout");

    let mut uow = deps.unit_of_work.begin().await?;
    let mut cycle: WorkoutCycle = get_for_update(&mut uow, &path.cycle()).await?;
    let workout: Workout = get_for_update(&mut uow, &path).await?;

    IndividualExercise::rewind_for_workout(workout.id, &mut uow).await?;
    Workout::delete(&path, &mut uow).await?;
    decrement_indexes_after::<WorkoutMarker>(cycle.id, workout.index, &mut uow).await?;

    cycle.raise_status_changed(path.user_id);
    uow.dispatch(cycle.events.drain()).await?;
    uow.commit().await?;
    Ok(())
}

pub async fn move_workout(
    path: WorkoutPath,
    direction: Direction,
    deps: &ServerDeps,
) -> Result<Workout> {
    let mut uow = deps.unit_of_work.begin().await?;
    lock_for_update(&mut uow, &path.cycle()).await?;

    let workout = Workout::find(&path, &mut uow).await?;
    let target = direction.target(workout.index)?;
    swap_by_index::<WorkoutMarker>(&mut uow, workout.workout_cycle_id, workout.index, target)
        .await?;

    let moved = Workout::find(&path, &mut uow).await?;
    uow.commit().await?;
    Ok(moved)
}
