use sqlx::PgConnection;
use tracing::info;

use crate::common::{Required, Result, UserId, WorkoutExercise as WorkoutExerciseMarker};
use crate::domains::exercises::{get_or_create_individual_exercise, IndividualExercise};
use crate::domains::workouts::data::{
    ExerciseChoice, ExerciseCompletion, WorkoutExerciseDetails, WorkoutExerciseInput,
};
use crate::domains::workouts::effects::completed_in;
use crate::domains::workouts::models::{SetStatus, Workout, WorkoutExercise, WorkoutSet};
use crate::kernel::persistence::{
    decrement_indexes_after, insert_position, lock_for_update, swap_by_index,
    WorkoutExercisePath, WorkoutPath,
};
use crate::kernel::{ServerDeps, UnitOfWork};

use super::carry_over::insert_planned_exercise;
use super::chain::{lock_exercise_chain, lock_set_chain, lock_workout_chain};
use super::moves::Direction;

/// Adds an exercise slot with `sets_qt` pending sets to a workout.
///
/// The sets are planned from the individual exercise's last completed slot.
pub async fn create_workout_exercise(
    path: WorkoutPath,
    input: &WorkoutExerciseInput,
    deps: &ServerDeps,
) -> Result<WorkoutExerciseDetails> {
    input.validate()?;
    info!(
        user_id = %path.user_id,
        workout_id = %path.workout_id,
        sets_qt = input.sets_qt,
        "Creating workout exercise"
    );

    let mut uow = deps.unit_of_work.begin().await?;
    let workout = lock_workout_chain(&mut uow, &path).await?;
    let individual = resolve_choice(path.user_id, &input.exercise, &mut uow, deps).await?;

    let index = insert_position::<WorkoutExerciseMarker>(workout.id, input.index, &mut uow).await?;
    let mut exercise = insert_planned_exercise(
        &mut uow,
        path.user_id,
        workout.id,
        index,
        individual.id,
        individual.last_completed_workout_exercise_id,
        input.sets_qt,
    )
    .await?;

    exercise.raise_membership_changed(path.user_id);
    uow.dispatch(exercise.events.drain()).await?;

    let exercise = WorkoutExercise::find(&path.exercise(exercise.id), &mut uow).await?;
    let details = load_exercise_details(path.user_id, exercise, &mut uow).await?;
    uow.commit().await?;
    Ok(details)
}

async fn resolve_choice(
    user_id: UserId,
    choice: &ExerciseChoice,
    uow: &mut UnitOfWork,
    deps: &ServerDeps,
) -> Result<IndividualExercise> {
    match choice {
        ExerciseChoice::Existing(id) => IndividualExercise::find_for_user(user_id, *id, uow).await,
        ExerciseChoice::Lookup(input) => {
            get_or_create_individual_exercise(user_id, input, Some(uow), deps).await
        }
    }
}

pub(crate) async fn load_exercise_details(
    user_id: UserId,
    exercise: WorkoutExercise,
    conn: &mut PgConnection,
) -> Result<WorkoutExerciseDetails> {
    let individual =
        IndividualExercise::find_for_user(user_id, exercise.individual_exercise_id, &mut *conn)
            .await?
            .with_details(&mut *conn)
            .await?;
    let sets = WorkoutSet::find_by_exercise(exercise.id, conn).await?;

    Ok(WorkoutExerciseDetails {
        workout_exercise: exercise,
        individual_exercise: individual,
        sets,
    })
}

pub async fn get_workout_exercise(
    path: WorkoutExercisePath,
    deps: &ServerDeps,
) -> Result<WorkoutExerciseDetails> {
    let mut conn = deps.db_pool.acquire().await?;
    let exercise = WorkoutExercise::find(&path, &mut conn).await?;
    load_exercise_details(path.user_id, exercise, &mut conn).await
}

/// Deletes a slot with its sets and closes the gap in the workout's indexes.
pub async fn delete_workout_exercise(path: WorkoutExercisePath, deps: &ServerDeps) -> Result<()> {
    info!(
        user_id = %path.user_id,
        workout_exercise_id = %path.workout_exercise_id,
        "Deleting workout exercise"
    );

    let mut uow = deps.unit_of_work.begin().await?;
    let mut exercise = remove_exercise(&mut uow, &path).await?;
    decrement_indexes_after::<WorkoutExerciseMarker>(exercise.workout_id, exercise.index, &mut uow)
        .await?;

    exercise.raise_membership_changed(path.user_id);
    uow.dispatch(exercise.events.drain()).await?;
    uow.commit().await?;
    Ok(())
}

/// Locks, unlinks from the carry-over pointer and deletes the slot.
async fn remove_exercise(uow: &mut UnitOfWork, path: &WorkoutExercisePath) -> Result<WorkoutExercise> {
    let exercise = lock_exercise_chain(uow, path).await?;
    IndividualExercise::rewind_last_completed(
        exercise.individual_exercise_id,
        exercise.id,
        exercise.previous_exercise_id,
        uow,
    )
    .await?;
    WorkoutExercise::delete(path, uow).await?;
    Ok(exercise)
}

pub async fn move_workout_exercise(
    path: WorkoutExercisePath,
    direction: Direction,
    deps: &ServerDeps,
) -> Result<WorkoutExercise> {
    let mut uow = deps.unit_of_work.begin().await?;
    lock_for_update(&mut uow, &path.cycle()).await?;
    lock_for_update(&mut uow, &path.workout()).await?;

    let exercise = WorkoutExercise::find(&path, &mut uow).await?;
    let target = direction.target(exercise.index)?;
    swap_by_index::<WorkoutExerciseMarker>(&mut uow, exercise.workout_id, exercise.index, target)
        .await?;

    let moved = WorkoutExercise::find(&path, &mut uow).await?;
    uow.commit().await?;
    Ok(moved)
}

/// Swaps the slot for a fresh one at the same index, with new sets planned
/// from the chosen exercise's history.
pub async fn replace_workout_exercise(
    path: WorkoutExercisePath,
    input: &WorkoutExerciseInput,
    deps: &ServerDeps,
) -> Result<WorkoutExerciseDetails> {
    input.validate()?;
    info!(
        user_id = %path.user_id,
        workout_exercise_id = %path.workout_exercise_id,
        "Replacing workout exercise"
    );

    let mut uow = deps.unit_of_work.begin().await?;
    let old = remove_exercise(&mut uow, &path).await?;
    let individual = resolve_choice(path.user_id, &input.exercise, &mut uow, deps).await?;

    let mut exercise = insert_planned_exercise(
        &mut uow,
        path.user_id,
        old.workout_id,
        old.index,
        individual.id,
        individual.last_completed_workout_exercise_id,
        input.sets_qt,
    )
    .await?;

    exercise.raise_membership_changed(path.user_id);
    uow.dispatch(exercise.events.drain()).await?;

    let replacement = path.workout().exercise(exercise.id);
    let exercise = WorkoutExercise::find(&replacement, &mut uow).await?;
    let details = load_exercise_details(path.user_id, exercise, &mut uow).await?;
    uow.commit().await?;
    Ok(details)
}

/// Writes `status` onto every set of the slot and runs the cascade.
pub async fn complete_workout_exercise(
    path: WorkoutExercisePath,
    status: SetStatus,
    deps: &ServerDeps,
) -> Result<ExerciseCompletion> {
    info!(
        user_id = %path.user_id,
        workout_exercise_id = %path.workout_exercise_id,
        status = ?status,
        "Completing workout exercise"
    );

    let mut uow = deps.unit_of_work.begin().await?;
    let mut exercise = lock_set_chain(&mut uow, &path).await?;
    WorkoutSet::set_status_for_exercise(exercise.id, status, &mut uow).await?;

    exercise.raise_status_changed(path.user_id);
    uow.dispatch(exercise.events.drain()).await?;

    let exercise = WorkoutExercise::find(&path, &mut uow).await?;
    let sets = WorkoutSet::find_by_exercise(exercise.id, &mut uow).await?;
    let workout = Workout::find_by_id(exercise.workout_id, &mut uow)
        .await
        .required("workout")?;
    let energy = completed_in(&uow, workout.id)
        .then(|| workout.energy())
        .flatten();
    uow.commit().await?;

    Ok(ExerciseCompletion {
        workout_exercise: exercise,
        sets,
        workout,
        energy,
    })
}
