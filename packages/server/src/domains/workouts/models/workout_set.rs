use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, QueryBuilder};
use typed_builder::TypedBuilder;

use super::status::{CompletionFlags, SetStatus};
use crate::common::{Result, UserId, WorkoutError, WorkoutExerciseId, WorkoutSetId};
use crate::domains::workouts::events::{PendingEvents, WorkoutEvent};
use crate::kernel::persistence::{delete_scoped, find_scoped, push_filter, WorkoutSetPath};

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct WorkoutSet {
    pub id: WorkoutSetId,
    pub workout_exercise_id: WorkoutExerciseId,
    pub index: i32,
    pub weight: Option<f64>,
    /// Repetitions, or seconds for time-based exercises.
    pub reps: Option<i32>,
    pub previous_weight: Option<f64>,
    pub previous_reps: Option<i32>,
    pub completed: bool,
    pub skipped: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[sqlx(skip)]
    #[serde(skip)]
    pub events: PendingEvents,
}

#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct NewWorkoutSet {
    pub workout_exercise_id: WorkoutExerciseId,
    pub index: i32,
    #[builder(default)]
    pub weight: Option<f64>,
    #[builder(default)]
    pub reps: Option<i32>,
    #[builder(default)]
    pub previous_weight: Option<f64>,
    #[builder(default)]
    pub previous_reps: Option<i32>,
}

impl WorkoutSet {
    pub async fn insert(new: &NewWorkoutSet, conn: &mut PgConnection) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO workout_sets
                (workout_exercise_id, index, weight, reps, previous_weight, previous_reps)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(new.workout_exercise_id)
        .bind(new.index)
        .bind(new.weight)
        .bind(new.reps)
        .bind(new.previous_weight)
        .bind(new.previous_reps)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn find(path: &WorkoutSetPath, conn: &mut PgConnection) -> Result<Self> {
        find_scoped(path, conn).await
    }

    pub async fn find_by_exercise(
        workout_exercise_id: WorkoutExerciseId,
        conn: &mut PgConnection,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM workout_sets WHERE workout_exercise_id = $1 ORDER BY index, id",
        )
        .bind(workout_exercise_id)
        .fetch_all(conn)
        .await
        .map_err(Into::into)
    }

    /// Up to `limit` sets of a carry-over source slot, in index order.
    ///
    /// The slot must belong to `user_id` through a live plan; anything else
    /// reads as "no prior sets".
    pub async fn find_prior(
        user_id: UserId,
        source: WorkoutExerciseId,
        limit: i64,
        conn: &mut PgConnection,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT s.* FROM workout_sets s
             JOIN workout_exercises we ON we.id = s.workout_exercise_id
             JOIN workouts w ON w.id = we.workout_id
             JOIN workout_cycles c ON c.id = w.workout_cycle_id
             JOIN workout_plans p ON p.id = c.workout_plan_id
             WHERE we.id = $1 AND p.user_id = $2 AND p.deleted_at IS NULL
             ORDER BY s.index, s.id
             LIMIT $3",
        )
        .bind(source)
        .bind(user_id)
        .bind(limit)
        .fetch_all(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn update(
        path: &WorkoutSetPath,
        weight: Option<f64>,
        reps: Option<i32>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let mut qb = QueryBuilder::new("UPDATE workout_sets SET weight = COALESCE(");
        qb.push_bind(weight)
            .push(", weight), reps = COALESCE(")
            .push_bind(reps)
            .push(", reps), updated_at = NOW()");
        push_filter(&mut qb, path);
        qb.push(" RETURNING *");

        qb.build_query_as::<Self>()
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| WorkoutError::not_found("workout set"))
    }

    pub async fn delete(path: &WorkoutSetPath, conn: &mut PgConnection) -> Result<Self> {
        delete_scoped(path, conn).await
    }

    /// Writes the status of one set and raises `WorkoutSetStatusChanged`.
    pub async fn set_status(
        path: &WorkoutSetPath,
        status: SetStatus,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let flags = status.flags();
        let mut qb = QueryBuilder::new("UPDATE workout_sets SET completed = ");
        qb.push_bind(flags.completed)
            .push(", skipped = ")
            .push_bind(flags.skipped)
            .push(", updated_at = NOW()");
        push_filter(&mut qb, path);
        qb.push(" RETURNING *");

        let mut set = qb
            .build_query_as::<Self>()
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| WorkoutError::not_found("workout set"))?;

        set.raise_status_changed(path.user_id);
        Ok(set)
    }

    /// Writes `status` onto every set of a slot.
    pub async fn set_status_for_exercise(
        workout_exercise_id: WorkoutExerciseId,
        status: SetStatus,
        conn: &mut PgConnection,
    ) -> Result<u64> {
        let flags = status.flags();
        let result = sqlx::query(
            "UPDATE workout_sets SET completed = $2, skipped = $3, updated_at = NOW()
             WHERE workout_exercise_id = $1",
        )
        .bind(workout_exercise_id)
        .bind(flags.completed)
        .bind(flags.skipped)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Copies the sets of `source` under `target` as pending sets whose
    /// previous values are the source's logged values, or the source's own
    /// previous values where nothing was logged.
    pub async fn clone_into(
        source: WorkoutExerciseId,
        target: WorkoutExerciseId,
        conn: &mut PgConnection,
    ) -> Result<u64> {
        let result = sqlx::query(
            "INSERT INTO workout_sets (workout_exercise_id, index, previous_weight, previous_reps)
             SELECT $2, index, COALESCE(weight, previous_weight), COALESCE(reps, previous_reps)
             FROM workout_sets
             WHERE workout_exercise_id = $1
             ORDER BY index, id",
        )
        .bind(source)
        .bind(target)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    pub fn flags(&self) -> CompletionFlags {
        CompletionFlags::of(self.completed, self.skipped)
    }

    pub fn raise_status_changed(&mut self, user_id: UserId) {
        self.events.raise(WorkoutEvent::WorkoutSetStatusChanged {
            user_id,
            workout_exercise_id: self.workout_exercise_id,
        });
    }
}
