use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, QueryBuilder};
use typed_builder::TypedBuilder;

use super::status::CompletionFlags;
use crate::common::{CycleId, Result, UserId, WorkoutError, WorkoutId};
use crate::domains::workouts::energy::EnergyEstimate;
use crate::domains::workouts::events::{PendingEvents, WorkoutEvent};
use crate::kernel::persistence::{delete_scoped, find_scoped, push_filter, WorkoutPath};

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Workout {
    pub id: WorkoutId,
    pub workout_cycle_id: CycleId,
    pub name: String,
    pub date: Option<DateTime<Utc>>,
    pub index: i32,
    pub completed: bool,
    pub skipped: bool,
    pub previous_workout_id: Option<WorkoutId>,
    /// Set on the first completion and never cleared.
    pub first_completed_at: Option<DateTime<Utc>>,

    // Energy summary, filled when the workout completes
    pub calories: Option<f64>,
    pub active_minutes: Option<f64>,
    pub rest_minutes: Option<f64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[sqlx(skip)]
    #[serde(skip)]
    pub events: PendingEvents,
}

/// Row values for a new workout.
#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct NewWorkout {
    pub workout_cycle_id: CycleId,
    pub name: String,
    pub index: i32,
    #[builder(default)]
    pub date: Option<DateTime<Utc>>,
    #[builder(default)]
    pub previous_workout_id: Option<WorkoutId>,
}

/// Result of writing derived flags onto a workout.
#[derive(Debug, Clone)]
pub struct StatusTransition {
    pub before: CompletionFlags,
    pub after: CompletionFlags,
    /// `first_completed_at` before the write; `None` means it had never been completed.
    pub previously_completed_at: Option<DateTime<Utc>>,
    pub workout: Workout,
}

impl StatusTransition {
    pub fn became_completed(&self) -> bool {
        !self.before.completed && self.after.completed
    }
}

impl Workout {
    pub async fn insert(new: &NewWorkout, conn: &mut PgConnection) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO workouts (workout_cycle_id, name, date, index, previous_workout_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(new.workout_cycle_id)
        .bind(&new.name)
        .bind(new.date)
        .bind(new.index)
        .bind(new.previous_workout_id)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn find(path: &WorkoutPath, conn: &mut PgConnection) -> Result<Self> {
        find_scoped(path, conn).await
    }

    /// Unscoped read for rows already reached through a scoped lock.
    pub async fn find_by_id(id: WorkoutId, conn: &mut PgConnection) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM workouts WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(Into::into)
    }

    /// Row-locks the workout and reports whether it is still completed.
    pub async fn lock_completed(id: WorkoutId, conn: &mut PgConnection) -> Result<bool> {
        let completed = sqlx::query_scalar::<_, bool>(
            "SELECT completed FROM workouts WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(completed.unwrap_or(false))
    }

    pub async fn find_by_cycle(cycle_id: CycleId, conn: &mut PgConnection) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM workouts WHERE workout_cycle_id = $1 ORDER BY index, id",
        )
        .bind(cycle_id)
        .fetch_all(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn update(
        path: &WorkoutPath,
        name: Option<&str>,
        date: Option<DateTime<Utc>>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let mut qb = QueryBuilder::new("UPDATE workouts SET name = COALESCE(");
        qb.push_bind(name.map(str::to_string))
            .push(", name), date = COALESCE(")
            .push_bind(date)
            .push(", date), updated_at = NOW()");
        push_filter(&mut qb, path);
        qb.push(" RETURNING *");

        qb.build_query_as::<Self>()
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| WorkoutError::not_found("workout"))
    }

    pub async fn delete(path: &WorkoutPath, conn: &mut PgConnection) -> Result<Self> {
        delete_scoped(path, conn).await
    }

    /// Writes derived flags. Completing stamps `date` when it is unset;
    /// going back to pending clears the energy summary.
    pub async fn apply_status(
        id: WorkoutId,
        flags: CompletionFlags,
        conn: &mut PgConnection,
    ) -> Result<Option<StatusTransition>> {
        let Some(current) = Self::find_by_id(id, &mut *conn).await? else {
            return Ok(None);
        };
        let before = CompletionFlags::of(current.completed, current.skipped);

        let workout = sqlx::query_as::<_, Self>(
            "UPDATE workouts SET
                completed = $2,
                skipped = $3,
                date = CASE WHEN $2 AND date IS NULL THEN NOW() ELSE date END,
                first_completed_at = CASE WHEN $2 THEN COALESCE(first_completed_at, NOW())
                                          ELSE first_completed_at END,
                calories = CASE WHEN $2 THEN calories END,
                active_minutes = CASE WHEN $2 THEN active_minutes END,
                rest_minutes = CASE WHEN $2 THEN rest_minutes END,
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(flags.completed)
        .bind(flags.skipped)
        .fetch_one(conn)
        .await?;

        Ok(Some(StatusTransition {
            before,
            after: flags,
            previously_completed_at: current.first_completed_at,
            workout,
        }))
    }

    pub async fn save_summary(
        id: WorkoutId,
        estimate: &EnergyEstimate,
        conn: &mut PgConnection,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE workouts SET calories = $2, active_minutes = $3, rest_minutes = $4, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(estimate.calories)
        .bind(estimate.active_minutes)
        .bind(estimate.rest_minutes)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub fn flags(&self) -> CompletionFlags {
        CompletionFlags::of(self.completed, self.skipped)
    }

    /// Persisted energy summary, if one was computed.
    pub fn energy(&self) -> Option<EnergyEstimate> {
        Some(EnergyEstimate {
            calories: self.calories?,
            active_minutes: self.active_minutes.unwrap_or_default(),
            rest_minutes: self.rest_minutes.unwrap_or_default(),
        })
    }

    /// Queue a re-derivation of the parent cycle's flags.
    pub fn raise_membership_changed(&mut self, user_id: UserId) {
        self.events.raise(WorkoutEvent::WorkoutCycleStatusChanged {
            user_id,
            cycle_id: self.workout_cycle_id,
        });
    }
}
