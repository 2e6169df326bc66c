use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgConnection;

use super::{Exercise, MuscleGroup};
use crate::common::{
    CycleId, ExerciseId, IndividualExerciseId, MuscleGroupId, Result, UserId, WorkoutError,
    WorkoutExerciseId, WorkoutId, WorkoutSetId,
};

/// A user's own instance of an exercise. Carries the carry-over pointer to
/// the last completed workout exercise.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize)]
pub struct IndividualExercise {
    pub id: IndividualExerciseId,
    pub user_id: UserId,
    pub name: String,
    pub muscle_group_id: Option<MuscleGroupId>,
    pub exercise_id: Option<ExerciseId>,
    pub last_completed_workout_exercise_id: Option<WorkoutExerciseId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Individual exercise with its muscle group and catalog entry.
#[derive(Debug, Clone, Serialize)]
pub struct IndividualExerciseDetails {
    #[serde(flatten)]
    pub individual_exercise: IndividualExercise,
    pub muscle_group: Option<MuscleGroup>,
    pub exercise: Option<Exercise>,
}

/// One logged set from the performance history.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceRecord {
    pub workout_set_id: WorkoutSetId,
    pub workout_exercise_id: WorkoutExerciseId,
    pub workout_id: WorkoutId,
    pub date: Option<DateTime<Utc>>,
    pub index: i32,
    pub weight: f64,
    pub reps: i32,
}

impl IndividualExercise {
    /// Inserts, or returns the existing row with the same
    /// `(user, name, muscle group)`. A catalog link is filled in when the
    /// existing row has none.
    pub async fn insert_or_get(
        user_id: UserId,
        name: &str,
        muscle_group_id: Option<MuscleGroupId>,
        exercise_id: Option<ExerciseId>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO individual_exercises (user_id, name, muscle_group_id, exercise_id)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, name, muscle_group_id) DO UPDATE SET
                exercise_id = COALESCE(individual_exercises.exercise_id, EXCLUDED.exercise_id),
                updated_at = NOW()
             RETURNING *",
        )
        .bind(user_id)
        .bind(name)
        .bind(muscle_group_id)
        .bind(exercise_id)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn find_for_user(
        user_id: UserId,
        id: IndividualExerciseId,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM individual_exercises WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| WorkoutError::not_found("individual exercise"))
    }

    pub async fn find_by_exercise(
        user_id: UserId,
        exercise_id: ExerciseId,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM individual_exercises
             WHERE user_id = $1 AND exercise_id = $2
             ORDER BY id
             LIMIT 1",
        )
        .bind(user_id)
        .bind(exercise_id)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_identity(
        user_id: UserId,
        name: &str,
        muscle_group_id: Option<MuscleGroupId>,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM individual_exercises
             WHERE user_id = $1 AND name = $2 AND muscle_group_id IS NOT DISTINCT FROM $3
             ORDER BY id
             LIMIT 1",
        )
        .bind(user_id)
        .bind(name)
        .bind(muscle_group_id)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_user(user_id: UserId, conn: &mut PgConnection) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM individual_exercises WHERE user_id = $1 ORDER BY name, id",
        )
        .bind(user_id)
        .fetch_all(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn set_last_completed(
        id: IndividualExerciseId,
        workout_exercise_id: WorkoutExerciseId,
        conn: &mut PgConnection,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE individual_exercises
             SET last_completed_workout_exercise_id = $2, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(workout_exercise_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Moves the pointer back from `from` to `to`, only if it still points at `from`.
    pub async fn rewind_last_completed(
        id: IndividualExerciseId,
        from: WorkoutExerciseId,
        to: Option<WorkoutExerciseId>,
        conn: &mut PgConnection,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE individual_exercises
             SET last_completed_workout_exercise_id = $3, updated_at = NOW()
             WHERE id = $1 AND last_completed_workout_exercise_id = $2",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Rewinds every pointer aimed at a workout exercise under `workout_id`
    /// to that exercise's own carry-over source.
    pub async fn rewind_for_workout(workout_id: WorkoutId, conn: &mut PgConnection) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE individual_exercises ie
             SET last_completed_workout_exercise_id = we.previous_exercise_id, updated_at = NOW()
             FROM workout_exercises we
             WHERE we.workout_id = $1 AND ie.last_completed_workout_exercise_id = we.id",
        )
        .bind(workout_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Same as [`rewind_for_workout`](Self::rewind_for_workout) for a whole cycle.
    pub async fn rewind_for_cycle(
        cycle_id: CycleId,
        conn: &mut PgConnection,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE individual_exercises ie
             SET last_completed_workout_exercise_id = we.previous_exercise_id, updated_at = NOW()
             FROM workout_exercises we
             JOIN workouts w ON w.id = we.workout_id
             WHERE w.workout_cycle_id = $1 AND ie.last_completed_workout_exercise_id = we.id",
        )
        .bind(cycle_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Logged sets with weight and reps from completed, performed slots,
    /// newest workout first.
    pub async fn history(
        user_id: UserId,
        id: IndividualExerciseId,
        limit: i64,
        conn: &mut PgConnection,
    ) -> Result<Vec<PerformanceRecord>> {
        sqlx::query_as::<_, PerformanceRecord>(
            "SELECT s.id AS workout_set_id, we.id AS workout_exercise_id, w.id AS workout_id,
                    w.date, s.index, s.weight, s.reps
             FROM workout_sets s
             JOIN workout_exercises we ON we.id = s.workout_exercise_id
             JOIN workouts w ON w.id = we.workout_id
             JOIN workout_cycles c ON c.id = w.workout_cycle_id
             JOIN workout_plans p ON p.id = c.workout_plan_id
             WHERE we.individual_exercise_id = $1
               AND p.user_id = $2
               AND p.deleted_at IS NULL
               AND we.completed AND NOT we.skipped
               AND s.completed AND NOT s.skipped
               AND s.reps IS NOT NULL AND s.weight IS NOT NULL
             ORDER BY w.date DESC NULLS LAST, we.id DESC, s.index
             LIMIT $3",
        )
        .bind(id)
        .bind(user_id)
        .bind(limit)
        .fetch_all(conn)
        .await
        .map_err(Into::into)
    }

    /// Loads the muscle group and catalog entry alongside.
    pub async fn with_details(self, conn: &mut PgConnection) -> Result<IndividualExerciseDetails> {
        let muscle_group = match self.muscle_group_id {
            Some(id) => Some(MuscleGroup::find_by_id(id, &mut *conn).await?),
            None => None,
        };
        let exercise = match self.exercise_id {
            Some(id) => Some(Exercise::find_by_id(id, &mut *conn).await?),
            None => None,
        };
        Ok(IndividualExerciseDetails {
            individual_exercise: self,
            muscle_group,
            exercise,
        })
    }
}
