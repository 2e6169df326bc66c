use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, QueryBuilder};

use crate::common::{CycleId, PlanId, Result, UserId, WorkoutError};
use crate::kernel::persistence::{find_scoped, push_filter, scoped, PlanPath, Table};
use crate::kernel::UnitOfWork;

/// A user's training plan. Soft-deleted plans are invisible to every scope.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct WorkoutPlan {
    pub id: PlanId,
    pub user_id: UserId,
    pub name: String,
    pub active: bool,
    pub current_cycle_id: Option<CycleId>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkoutPlan {
    pub async fn insert(
        user_id: UserId,
        name: &str,
        active: bool,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO workout_plans (user_id, name, active)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(user_id)
        .bind(name)
        .bind(active)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn find(path: &PlanPath, conn: &mut PgConnection) -> Result<Self> {
        find_scoped(path, conn).await
    }

    pub async fn find_by_user(user_id: UserId, conn: &mut PgConnection) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM workout_plans
             WHERE user_id = $1 AND deleted_at IS NULL
             ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn find_active(user_id: UserId, conn: &mut PgConnection) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM workout_plans
             WHERE user_id = $1 AND active AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    /// Locks every live plan of the user, lowest id first.
    ///
    /// Taken before flipping `active` so two activations serialize.
    pub async fn lock_all_for_user(user_id: UserId, uow: &mut UnitOfWork) -> Result<Vec<PlanId>> {
        uow.note_lock(Table::WorkoutPlans);
        sqlx::query_scalar::<_, PlanId>(
            "SELECT id FROM workout_plans
             WHERE user_id = $1 AND deleted_at IS NULL
             ORDER BY id
             FOR UPDATE",
        )
        .bind(user_id)
        .fetch_all(&mut **uow)
        .await
        .map_err(Into::into)
    }

    /// Clears `active` on every other plan of the user.
    pub async fn deactivate_others(
        user_id: UserId,
        keep: Option<PlanId>,
        conn: &mut PgConnection,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE workout_plans SET active = false, updated_at = NOW()
             WHERE user_id = $1 AND active AND ($2::BIGINT IS NULL OR id <> $2)",
        )
        .bind(user_id)
        .bind(keep)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn update(
        path: &PlanPath,
        name: Option<&str>,
        active: Option<bool>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let mut qb = QueryBuilder::new("UPDATE workout_plans SET name = COALESCE(");
        qb.push_bind(name.map(str::to_string))
            .push(", name), active = COALESCE(")
            .push_bind(active)
            .push(", active), updated_at = NOW()");
        push_filter(&mut qb, path);
        qb.push(" RETURNING *");

        qb.build_query_as::<Self>()
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| WorkoutError::not_found("workout plan"))
    }

    pub async fn set_current_cycle(
        id: PlanId,
        cycle_id: Option<CycleId>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE workout_plans SET current_cycle_id = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(cycle_id)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    /// Marks the plan deleted and inactive. It stays in the table until the
    /// external cleanup job removes it.
    pub async fn soft_delete(path: &PlanPath, conn: &mut PgConnection) -> Result<Self> {
        let mut qb = scoped(
            "UPDATE workout_plans SET deleted_at = NOW(), active = false, updated_at = NOW()",
            path,
        );
        qb.push(" RETURNING *");

        qb.build_query_as::<Self>()
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| WorkoutError::not_found("workout plan"))
    }
}
