//! Shared catalog. Callers are expected to be admins; role checks live in the
//! transport.

use tracing::info;

use crate::common::{ExerciseId, Result, WorkoutError};
use crate::domains::exercises::models::{Exercise, MuscleGroup, NewExercise};
use crate::kernel::ServerDeps;

pub async fn create_muscle_group(name: &str, deps: &ServerDeps) -> Result<MuscleGroup> {
    let name = name.trim();
    if name.is_empty() {
        return Err(WorkoutError::validation("muscle group name is required"));
    }

    let mut conn = deps.db_pool.acquire().await?;
    let group = MuscleGroup::insert(name, &mut conn).await?;

    info!(muscle_group_id = %group.id, name = %group.name, "Muscle group created");
    Ok(group)
}

pub async fn list_muscle_groups(deps: &ServerDeps) -> Result<Vec<MuscleGroup>> {
    let mut conn = deps.db_pool.acquire().await?;
    MuscleGroup::find_all(&mut conn).await
}

/// Adds a catalog exercise. The slug is derived from the name when absent.
pub async fn create_exercise(input: &NewExercise, deps: &ServerDeps) -> Result<Exercise> {
    if input.name.trim().is_empty() {
        return Err(WorkoutError::validation("exercise name is required"));
    }

    let mut conn = deps.db_pool.acquire().await?;
    if let Some(group_id) = input.muscle_group_id {
        MuscleGroup::find_by_id(group_id, &mut conn).await?;
    }
    let exercise = Exercise::insert(input, &mut conn).await?;

    info!(exercise_id = %exercise.id, slug = %exercise.slug, "Catalog exercise created");
    Ok(exercise)
}

pub async fn get_exercise(id: ExerciseId, deps: &ServerDeps) -> Result<Exercise> {
    let mut conn = deps.db_pool.acquire().await?;
    Exercise::find_by_id(id, &mut conn).await
}

pub async fn list_exercises(deps: &ServerDeps) -> Result<Vec<Exercise>> {
    let mut conn = deps.db_pool.acquire().await?;
    Exercise::find_all(&mut conn).await
}
