//! Pessimistic row locks.
//!
//! Every mutating path takes its locks in [`Table`] order, skipping levels it
//! does not touch. The unit of work remembers the deepest table locked so far
//! and logs a warning when a path climbs back up.

use sqlx::postgres::PgRow;
use sqlx::{FromRow, QueryBuilder};

use super::scope::{push_filter, OwnershipScope};
use crate::common::{Result, WorkoutError};
use crate::kernel::UnitOfWork;

/// Owned tables in lock order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
    WorkoutPlans,
    WorkoutCycles,
    Workouts,
    WorkoutExercises,
    IndividualExercises,
    WorkoutSets,
}

impl Table {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WorkoutPlans => "workout_plans",
            Self::WorkoutCycles => "workout_cycles",
            Self::Workouts => "workouts",
            Self::WorkoutExercises => "workout_exercises",
            Self::IndividualExercises => "individual_exercises",
            Self::WorkoutSets => "workout_sets",
        }
    }
}

/// Locks the row selected by `scope`.
///
/// Fails with `NotFound` when the row is absent or owned by someone else.
pub async fn lock_for_update<S: OwnershipScope>(uow: &mut UnitOfWork, scope: &S) -> Result<()> {
    uow.note_lock(S::TABLE);

    let mut qb = QueryBuilder::new(format!("SELECT id FROM {}", S::TABLE.as_str()));
    push_filter(&mut qb, scope);
    qb.push(" FOR UPDATE");

    qb.build()
        .fetch_optional(&mut **uow)
        .await?
        .map(|_| ())
        .ok_or_else(|| WorkoutError::not_found(S::ENTITY))
}

/// Locks and returns the row selected by `scope`.
pub async fn get_for_update<S, T>(uow: &mut UnitOfWork, scope: &S) -> Result<T>
where
    S: OwnershipScope,
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    uow.note_lock(S::TABLE);

    let mut qb = QueryBuilder::new(format!("SELECT * FROM {}", S::TABLE.as_str()));
    push_filter(&mut qb, scope);
    qb.push(" FOR UPDATE");

    qb.build_query_as::<T>()
        .fetch_optional(&mut **uow)
        .await?
        .ok_or_else(|| WorkoutError::not_found(S::ENTITY))
}

/// Locks a batch of rows of one table in ascending id order.
///
/// Returns how many of `ids` still exist.
pub async fn lock_ids_in_order(uow: &mut UnitOfWork, table: Table, ids: &[i64]) -> Result<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    uow.note_lock(table);

    let sql = format!(
        "SELECT id FROM {} WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        table.as_str()
    );
    let rows: Vec<i64> = sqlx::query_scalar(&sql)
        .bind(ids)
        .fetch_all(&mut **uow)
        .await?;

    Ok(rows.len())
}
