use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgConnection;

use super::status::CompletionFlags;
use crate::common::{IndividualExerciseId, Result, UserId, WorkoutExerciseId, WorkoutId};
use crate::domains::workouts::events::{PendingEvents, WorkoutEvent};
use crate::kernel::persistence::{delete_scoped, find_scoped, WorkoutExercisePath};

/// An exercise slot inside a workout.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct WorkoutExercise {
    pub id: WorkoutExerciseId,
    pub workout_id: WorkoutId,
    pub index: i32,
    pub individual_exercise_id: IndividualExerciseId,
    /// Carry-over source: the slot this one was planned from.
    pub previous_exercise_id: Option<WorkoutExerciseId>,
    pub completed: bool,
    pub skipped: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[sqlx(skip)]
    #[serde(skip)]
    pub events: PendingEvents,
}

impl WorkoutExercise {
    pub async fn insert(
        workout_id: WorkoutId,
        index: i32,
        individual_exercise_id: IndividualExerciseId,
        previous_exercise_id: Option<WorkoutExerciseId>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO workout_exercises (workout_id, index, individual_exercise_id, previous_exercise_id)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(workout_id)
        .bind(index)
        .bind(individual_exercise_id)
        .bind(previous_exercise_id)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn find(path: &WorkoutExercisePath, conn: &mut PgConnection) -> Result<Self> {
        find_scoped(path, conn).await
    }

    /// Unscoped read for rows already reached through a scoped lock.
    pub async fn find_by_id(
        id: WorkoutExerciseId,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM workout_exercises WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_workout(workout_id: WorkoutId, conn: &mut PgConnection) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM workout_exercises WHERE workout_id = $1 ORDER BY index, id",
        )
        .bind(workout_id)
        .fetch_all(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn delete(path: &WorkoutExercisePath, conn: &mut PgConnection) -> Result<Self> {
        delete_scoped(path, conn).await
    }

    pub async fn set_flags(
        id: WorkoutExerciseId,
        flags: CompletionFlags,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE workout_exercises SET completed = $2, skipped = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(flags.completed)
        .bind(flags.skipped)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    pub fn flags(&self) -> CompletionFlags {
        CompletionFlags::of(self.completed, self.skipped)
    }

    /// Queue a re-derivation of this slot's flags from its sets.
    pub fn raise_status_changed(&mut self, user_id: UserId) {
        self.events.raise(WorkoutEvent::WorkoutSetStatusChanged {
            user_id,
            workout_exercise_id: self.id,
        });
    }

    /// Queue a re-derivation of the parent workout's flags.
    pub fn raise_membership_changed(&mut self, user_id: UserId) {
        self.events.raise(WorkoutEvent::WorkoutExerciseStatusChanged {
            user_id,
            workout_id: self.workout_id,
        });
    }
}
