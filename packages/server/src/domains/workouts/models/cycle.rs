use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, QueryBuilder};

use super::status::CompletionFlags;
use crate::common::{CycleId, PlanId, Result, UserId, WorkoutError};
use crate::domains::workouts::events::{PendingEvents, WorkoutEvent};
use crate::kernel::persistence::{find_scoped, push_filter, push_parent_filter, CyclePath, PlanPath};

/// One week of a plan. Cycles of a plan form a doubly-linked list through
/// `previous_cycle_id` / `next_cycle_id`.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct WorkoutCycle {
    pub id: CycleId,
    pub workout_plan_id: PlanId,
    pub name: String,
    pub week_number: i32,
    pub completed: bool,
    pub skipped: bool,
    pub previous_cycle_id: Option<CycleId>,
    pub next_cycle_id: Option<CycleId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[sqlx(skip)]
    #[serde(skip)]
    pub events: PendingEvents,
}

/// Display name of the cycle for `week_number`.
pub fn week_name(week_number: i32) -> String {
    format!("Week #{week_number}")
}

impl WorkoutCycle {
    pub async fn insert(
        plan_id: PlanId,
        week_number: i32,
        previous_cycle_id: Option<CycleId>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO workout_cycles (workout_plan_id, name, week_number, previous_cycle_id)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(plan_id)
        .bind(week_name(week_number))
        .bind(week_number)
        .bind(previous_cycle_id)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn find(path: &CyclePath, conn: &mut PgConnection) -> Result<Self> {
        find_scoped(path, conn).await
    }

    /// Unscoped read for rows already reached through a scoped lock.
    pub async fn find_by_id(id: CycleId, conn: &mut PgConnection) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM workout_cycles WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| WorkoutError::not_found("workout cycle"))
    }

    pub async fn find_by_plan(plan: &PlanPath, conn: &mut PgConnection) -> Result<Vec<Self>> {
        let mut qb = QueryBuilder::new("SELECT * FROM workout_cycles");
        push_parent_filter(&mut qb, "workout_plan_id", plan);
        qb.push(" ORDER BY week_number, id");

        qb.build_query_as::<Self>()
            .fetch_all(conn)
            .await
            .map_err(Into::into)
    }

    pub async fn rename(path: &CyclePath, name: &str, conn: &mut PgConnection) -> Result<Self> {
        let mut qb = QueryBuilder::new("UPDATE workout_cycles SET name = ");
        qb.push_bind(name.to_string()).push(", updated_at = NOW()");
        push_filter(&mut qb, path);
        qb.push(" RETURNING *");

        qb.build_query_as::<Self>()
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| WorkoutError::not_found("workout cycle"))
    }

    pub async fn set_flags(
        id: CycleId,
        flags: CompletionFlags,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE workout_cycles SET completed = $2, skipped = $3, updated_at = NOW()
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

    pub async fn set_next(
        id: CycleId,
        next: Option<CycleId>,
        conn: &mut PgConnection,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE workout_cycles SET next_cycle_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(next)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn set_previous(
        id: CycleId,
        previous: Option<CycleId>,
        conn: &mut PgConnection,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE workout_cycles SET previous_cycle_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(previous)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn delete(id: CycleId, conn: &mut PgConnection) -> Result<()> {
        let result = sqlx::query("DELETE FROM workout_cycles WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(WorkoutError::not_found("workout cycle"));
        }
        Ok(())
    }

    pub fn flags(&self) -> CompletionFlags {
        CompletionFlags::of(self.completed, self.skipped)
    }

    /// Queue a re-derivation of this cycle's flags.
    pub fn raise_status_changed(&mut self, user_id: UserId) {
        self.events.raise(WorkoutEvent::WorkoutCycleStatusChanged {
            user_id,
            cycle_id: self.id,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_name() {
        assert_eq!(week_name(1), "Week #1");
        assert_eq!(week_name(12), "Week #12");
    }
}
