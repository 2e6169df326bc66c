//! Ownership subqueries.
//!
//! Every owned row is reached through the chain
//! `plan → cycle → workout → workout exercise → set`, and every request
//! carries the full path of ids down to its target. A path renders as a
//! subquery yielding the target id only when each link matches and the plan
//! belongs to the user, so a foreign or mistyped id simply selects nothing
//! and surfaces as `NotFound`.
//!
//! ```text
//! UPDATE workout_sets SET ... WHERE id IN (
//!     SELECT s.id FROM workout_sets s
//!     JOIN workout_exercises we ON we.id = s.workout_exercise_id
//!     JOIN workouts w ON w.id = we.workout_id
//!     JOIN workout_cycles c ON c.id = w.workout_cycle_id
//!     JOIN workout_plans p ON p.id = c.workout_plan_id
//!     WHERE s.id = $1 AND we.id = $2 AND w.id = $3 AND c.id = $4
//!       AND p.id = $5 AND p.user_id = $6 AND p.deleted_at IS NULL
//! )
//! ```

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, Postgres, QueryBuilder};

use super::locks::Table;
use crate::common::{
    CycleId, PlanId, Result, UserId, WorkoutError, WorkoutExerciseId, WorkoutId, WorkoutSetId,
};

/// A path that can be rendered as an ownership-checked id filter.
pub trait OwnershipScope: Send + Sync {
    /// Table whose ids the scope selects.
    const TABLE: Table;

    /// Human name used in `NotFound` errors.
    const ENTITY: &'static str;

    fn user_id(&self) -> UserId;

    /// Appends `SELECT <id> FROM ... WHERE ...` with all ids bound.
    fn push_scope(&self, qb: &mut QueryBuilder<'_, Postgres>);
}

/// Starts `<prefix> WHERE id IN (<scope>)`.
///
/// Callers append whatever follows the filter (`RETURNING *`, `FOR UPDATE`).
pub fn scoped<'a, S: OwnershipScope>(prefix: &str, scope: &S) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(prefix);
    push_filter(&mut qb, scope);
    qb
}

/// Appends ` WHERE id IN (<scope>)` to a statement under construction.
pub fn push_filter<S: OwnershipScope>(qb: &mut QueryBuilder<'_, Postgres>, scope: &S) {
    push_parent_filter(qb, "id", scope);
}

/// Appends ` WHERE <column> IN (<scope>)`, selecting the children of an owned row.
pub fn push_parent_filter<S: OwnershipScope>(
    qb: &mut QueryBuilder<'_, Postgres>,
    column: &str,
    scope: &S,
) {
    qb.push(" WHERE ").push(column).push(" IN (");
    scope.push_scope(qb);
    qb.push(")");
}

/// `SELECT *` of the row selected by `scope`.
pub async fn find_scoped<S, T>(scope: &S, conn: &mut PgConnection) -> Result<T>
where
    S: OwnershipScope,
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut qb = scoped(&format!("SELECT * FROM {}", S::TABLE.as_str()), scope);
    qb.build_query_as::<T>()
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| WorkoutError::not_found(S::ENTITY))
}

/// Deletes the row selected by `scope` and returns it.
pub async fn delete_scoped<S, T>(scope: &S, conn: &mut PgConnection) -> Result<T>
where
    S: OwnershipScope,
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut qb = scoped(&format!("DELETE FROM {}", S::TABLE.as_str()), scope);
    qb.push(" RETURNING *");
    qb.build_query_as::<T>()
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| WorkoutError::not_found(S::ENTITY))
}

const PLAN_JOIN: &str = "";
const CYCLE_JOIN: &str = " JOIN workout_plans p ON p.id = c.workout_plan_id";
const WORKOUT_JOIN: &str = " JOIN workout_cycles c ON c.id = w.workout_cycle_id \
     JOIN workout_plans p ON p.id = c.workout_plan_id";
const EXERCISE_JOIN: &str = " JOIN workouts w ON w.id = we.workout_id \
     JOIN workout_cycles c ON c.id = w.workout_cycle_id \
     JOIN workout_plans p ON p.id = c.workout_plan_id";
const SET_JOIN: &str = " JOIN workout_exercises we ON we.id = s.workout_exercise_id \
     JOIN workouts w ON w.id = we.workout_id \
     JOIN workout_cycles c ON c.id = w.workout_cycle_id \
     JOIN workout_plans p ON p.id = c.workout_plan_id";

fn push_owner(qb: &mut QueryBuilder<'_, Postgres>, plan_id: PlanId, user_id: UserId) {
    qb.push(" AND p.id = ")
        .push_bind(plan_id)
        .push(" AND p.user_id = ")
        .push_bind(user_id)
        .push(" AND p.deleted_at IS NULL");
}

// ============================================================================
// Paths
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPath {
    pub user_id: UserId,
    pub plan_id: PlanId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CyclePath {
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub cycle_id: CycleId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutPath {
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub cycle_id: CycleId,
    pub workout_id: WorkoutId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutExercisePath {
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub cycle_id: CycleId,
    pub workout_id: WorkoutId,
    pub workout_exercise_id: WorkoutExerciseId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutSetPath {
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub cycle_id: CycleId,
    pub workout_id: WorkoutId,
    pub workout_exercise_id: WorkoutExerciseId,
    pub set_id: WorkoutSetId,
}

impl PlanPath {
    pub fn new(user_id: UserId, plan_id: PlanId) -> Self {
        Self { user_id, plan_id }
    }

    pub fn cycle(self, cycle_id: CycleId) -> CyclePath {
        CyclePath {
            user_id: self.user_id,
            plan_id: self.plan_id,
            cycle_id,
        }
    }
}

impl CyclePath {
    pub fn plan(&self) -> PlanPath {
        PlanPath::new(self.user_id, self.plan_id)
    }

    pub fn workout(self, workout_id: WorkoutId) -> WorkoutPath {
        WorkoutPath {
            user_id: self.user_id,
            plan_id: self.plan_id,
            cycle_id: self.cycle_id,
            workout_id,
        }
    }
}

impl WorkoutPath {
    pub fn plan(&self) -> PlanPath {
        PlanPath::new(self.user_id, self.plan_id)
    }

    pub fn cycle(&self) -> CyclePath {
        self.plan().cycle(self.cycle_id)
    }

    pub fn exercise(self, workout_exercise_id: WorkoutExerciseId) -> WorkoutExercisePath {
        WorkoutExercisePath {
            user_id: self.user_id,
            plan_id: self.plan_id,
            cycle_id: self.cycle_id,
            workout_id: self.workout_id,
            workout_exercise_id,
        }
    }
}

impl WorkoutExercisePath {
    pub fn cycle(&self) -> CyclePath {
        self.workout().cycle()
    }

    pub fn workout(&self) -> WorkoutPath {
        self.plan_cycle().workout(self.workout_id)
    }

    pub fn set(self, set_id: WorkoutSetId) -> WorkoutSetPath {
        WorkoutSetPath {
            user_id: self.user_id,
            plan_id: self.plan_id,
            cycle_id: self.cycle_id,
            workout_id: self.workout_id,
            workout_exercise_id: self.workout_exercise_id,
            set_id,
        }
    }

    fn plan_cycle(&self) -> CyclePath {
        PlanPath::new(self.user_id, self.plan_id).cycle(self.cycle_id)
    }
}

impl WorkoutSetPath {
    pub fn exercise(&self) -> WorkoutExercisePath {
        PlanPath::new(self.user_id, self.plan_id)
            .cycle(self.cycle_id)
            .workout(self.workout_id)
            .exercise(self.workout_exercise_id)
    }
}

// ============================================================================
// Scopes
// ============================================================================

impl OwnershipScope for PlanPath {
    const TABLE: Table = Table::WorkoutPlans;
    const ENTITY: &'static str = "workout plan";

    fn user_id(&self) -> UserId {
        self.user_id
    }

    fn push_scope(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push("SELECT p.id FROM workout_plans p")
            .push(PLAN_JOIN)
            .push(" WHERE TRUE");
        push_owner(qb, self.plan_id, self.user_id);
    }
}

impl OwnershipScope for CyclePath {
    const TABLE: Table = Table::WorkoutCycles;
    const ENTITY: &'static str = "workout cycle";

    fn user_id(&self) -> UserId {
        self.user_id
    }

    fn push_scope(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push("SELECT c.id FROM workout_cycles c")
            .push(CYCLE_JOIN)
            .push(" WHERE c.id = ")
            .push_bind(self.cycle_id);
        push_owner(qb, self.plan_id, self.user_id);
    }
}

impl OwnershipScope for WorkoutPath {
    const TABLE: Table = Table::Workouts;
    const ENTITY: &'static str = "workout";

    fn user_id(&self) -> UserId {
        self.user_id
    }

    fn push_scope(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push("SELECT w.id FROM workouts w")
            .push(WORKOUT_JOIN)
            .push(" WHERE w.id = ")
            .push_bind(self.workout_id)
            .push(" AND c.id = ")
            .push_bind(self.cycle_id);
        push_owner(qb, self.plan_id, self.user_id);
    }
}

impl OwnershipScope for WorkoutExercisePath {
    const TABLE: Table = Table::WorkoutExercises;
    const ENTITY: &'static str = "workout exercise";

    fn user_id(&self) -> UserId {
        self.user_id
    }

    fn push_scope(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push("SELECT we.id FROM workout_exercises we")
            .push(EXERCISE_JOIN)
            .push(" WHERE we.id = ")
            .push_bind(self.workout_exercise_id)
            .push(" AND w.id = ")
            .push_bind(self.workout_id)
            .push(" AND c.id = ")
            .push_bind(self.cycle_id);
        push_owner(qb, self.plan_id, self.user_id);
    }
}

impl OwnershipScope for WorkoutSetPath {
    const TABLE: Table = Table::WorkoutSets;
    const ENTITY: &'static str = "workout set";

    fn user_id(&self) -> UserId {
        self.user_id
    }

    fn push_scope(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push("SELECT s.id FROM workout_sets s")
            .push(SET_JOIN)
            .push(" WHERE s.id = ")
            .push_bind(self.set_id)
            .push(" AND we.id = ")
            .push_bind(self.workout_exercise_id)
            .push(" AND w.id = ")
            .push_bind(self.workout_id)
            .push(" AND c.id = ")
            .push_bind(self.cycle_id);
        push_owner(qb, self.plan_id, self.user_id);
    }
}
