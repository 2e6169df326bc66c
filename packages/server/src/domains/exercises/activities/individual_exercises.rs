use serde::Deserialize;
use sqlx::PgConnection;
use tracing::{debug, info};
use typed_builder::TypedBuilder;

use crate::common::{
    ExerciseId, IndividualExerciseId, MuscleGroupId, Result, UserId, WorkoutError,
};
use crate::domains::exercises::models::{
    Exercise, IndividualExercise, IndividualExerciseDetails, MuscleGroup, PerformanceRecord,
};
use crate::kernel::{ServerDeps, UnitOfWork};

const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 100;

/// Lookup keys for [`get_or_create_individual_exercise`].
#[derive(Debug, Clone, Default, Deserialize, TypedBuilder)]
#[builder(field_defaults(default, setter(into)))]
pub struct IndividualExerciseInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub muscle_group_id: Option<MuscleGroupId>,
    #[serde(default)]
    pub exercise_id: Option<ExerciseId>,
}

/// Returns the user's individual exercise matching `input`, creating it when
/// needed.
///
/// With a catalog `exercise_id` the user's instance of that exercise is
/// returned, or created from the catalog entry. Without one, the exercise is
/// matched by name and muscle group and created only when both are given.
///
/// Joins `ambient` when called from inside another use case.
pub async fn get_or_create_individual_exercise(
    user_id: UserId,
    input: &IndividualExerciseInput,
    ambient: Option<&mut UnitOfWork>,
    deps: &ServerDeps,
) -> Result<IndividualExercise> {
    let mut scope = deps.unit_of_work.join_or_begin(ambient).await?;
    let exercise = resolve(user_id, input, scope.uow()).await?;
    scope.finish().await?;
    Ok(exercise)
}

async fn resolve(
    user_id: UserId,
    input: &IndividualExerciseInput,
    conn: &mut PgConnection,
) -> Result<IndividualExercise> {
    if let Some(exercise_id) = input.exercise_id {
        if let Some(existing) =
            IndividualExercise::find_by_exercise(user_id, exercise_id, &mut *conn).await?
        {
            return Ok(existing);
        }

        let catalog = Exercise::find_by_id(exercise_id, &mut *conn).await?;
        let created = IndividualExercise::insert_or_get(
            user_id,
            &catalog.name,
            catalog.muscle_group_id,
            Some(catalog.id),
            conn,
        )
        .await?;
        info!(
            user_id = %user_id,
            individual_exercise_id = %created.id,
            exercise_id = %catalog.id,
            "Individual exercise created from catalog"
        );
        return Ok(created);
    }

    let name = input.name.as_deref().map(str::trim).filter(|n| !n.is_empty());

    if let Some(name) = name {
        if let Some(existing) =
            IndividualExercise::find_by_identity(user_id, name, input.muscle_group_id, &mut *conn)
                .await?
        {
            debug!(individual_exercise_id = %existing.id, "Matched individual exercise by name");
            return Ok(existing);
        }
    }

    match (name, input.muscle_group_id) {
        (Some(name), Some(group_id)) => {
            MuscleGroup::find_by_id(group_id, &mut *conn).await?;
            let created =
                IndividualExercise::insert_or_get(user_id, name, Some(group_id), None, conn).await?;
            info!(
                user_id = %user_id,
                individual_exercise_id = %created.id,
                "Individual exercise created"
            );
            Ok(created)
        }
        _ => Err(WorkoutError::validation(
            "name and muscle group are required to create an individual exercise",
        )),
    }
}

pub async fn get_individual_exercise(
    user_id: UserId,
    id: IndividualExerciseId,
    deps: &ServerDeps,
) -> Result<IndividualExerciseDetails> {
    let mut conn = deps.db_pool.acquire().await?;
    let exercise = IndividualExercise::find_for_user(user_id, id, &mut conn).await?;
    exercise.with_details(&mut conn).await
}

pub async fn list_individual_exercises(
    user_id: UserId,
    deps: &ServerDeps,
) -> Result<Vec<IndividualExercise>> {
    let mut conn = deps.db_pool.acquire().await?;
    IndividualExercise::find_by_user(user_id, &mut conn).await
}

/// Logged sets of an individual exercise, newest workout first.
pub async fn individual_exercise_history(
    user_id: UserId,
    id: IndividualExerciseId,
    limit: Option<i64>,
    deps: &ServerDeps,
) -> Result<Vec<PerformanceRecord>> {
    let mut conn = deps.db_pool.acquire().await?;
    IndividualExercise::find_for_user(user_id, id, &mut conn).await?;
    IndividualExercise::history(user_id, id, history_limit(limit), &mut conn).await
}

fn history_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_limit_defaults_and_clamps() {
        assert_eq!(history_limit(None), 50);
        assert_eq!(history_limit(Some(0)), 1);
        assert_eq!(history_limit(Some(-4)), 1);
        assert_eq!(history_limit(Some(20)), 20);
        assert_eq!(history_limit(Some(1_000)), 100);
    }

    #[test]
    fn test_input_builder() {
        let input = IndividualExerciseInput::builder()
            .name(Some("Bench Press".to_string()))
            .muscle_group_id(Some(MuscleGroupId::new(3)))
            .build();
        assert_eq!(input.exercise_id, None);
        assert_eq!(input.muscle_group_id, Some(MuscleGroupId::new(3)));
    }
}
