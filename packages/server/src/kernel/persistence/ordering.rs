//! Index reshuffling and status counts for the ordered collections.
//!
//! Workouts, workout exercises and sets keep a contiguous `index` of
//! `1..=N` under their parent. These helpers are parameterized by the child
//! entity marker, so one query shape serves all three tables.

use sqlx::{PgConnection, Postgres};

use super::locks::Table;
use crate::common::{Id, Result, WorkoutError};
use crate::common::{Workout, WorkoutCycle, WorkoutExercise, WorkoutSet};
use crate::kernel::UnitOfWork;

/// A child table ordered by `index` under a parent foreign key.
pub trait IndexedCollection {
    const TABLE: Table;
    const PARENT_COLUMN: &'static str;
    const ENTITY: &'static str;

    /// Marker of the parent entity.
    type Parent: 'static;
}

impl IndexedCollection for Workout {
    const TABLE: Table = Table::Workouts;
    const PARENT_COLUMN: &'static str = "workout_cycle_id";
    const ENTITY: &'static str = "workout";
    type Parent = WorkoutCycle;
}

impl IndexedCollection for WorkoutExercise {
    const TABLE: Table = Table::WorkoutExercises;
    const PARENT_COLUMN: &'static str = "workout_id";
    const ENTITY: &'static str = "workout exercise";
    type Parent = Workout;
}

impl IndexedCollection for WorkoutSet {
    const TABLE: Table = Table::WorkoutSets;
    const PARENT_COLUMN: &'static str = "workout_exercise_id";
    const ENTITY: &'static str = "workout set";
    type Parent = WorkoutExercise;
}

/// `MAX(index)` under `parent`, or 0 for an empty collection.
pub async fn max_index<C: IndexedCollection>(
    parent: Id<C::Parent>,
    conn: &mut PgConnection,
) -> Result<i32> {
    let sql = format!(
        "SELECT COALESCE(MAX(index), 0) FROM {} WHERE {} = $1",
        C::TABLE.as_str(),
        C::PARENT_COLUMN
    );
    let max = sqlx::query_scalar::<Postgres, i32>(&sql)
        .bind(parent)
        .fetch_one(conn)
        .await?;
    Ok(max)
}

/// Shift `index >= from` one slot down the list to make room.
pub async fn increment_indexes_after<C: IndexedCollection>(
    parent: Id<C::Parent>,
    from: i32,
    conn: &mut PgConnection,
) -> Result<u64> {
    let sql = format!(
        "UPDATE {} SET index = index + 1, updated_at = NOW() WHERE {} = $1 AND index >= $2",
        C::TABLE.as_str(),
        C::PARENT_COLUMN
    );
    let result = sqlx::query(&sql).bind(parent).bind(from).execute(conn).await?;
    Ok(result.rows_affected())
}

/// Close the gap left by a deleted `index`.
pub async fn decrement_indexes_after<C: IndexedCollection>(
    parent: Id<C::Parent>,
    deleted: i32,
    conn: &mut PgConnection,
) -> Result<u64> {
    let sql = format!(
        "UPDATE {} SET index = index - 1, updated_at = NOW() WHERE {} = $1 AND index > $2",
        C::TABLE.as_str(),
        C::PARENT_COLUMN
    );
    let result = sqlx::query(&sql)
        .bind(parent)
        .bind(deleted)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Swap the rows at indexes `a` and `b`.
///
/// Both rows are locked lowest id first. Fails with `NotFound` when fewer
/// than two rows sit at those indexes.
pub async fn swap_by_index<C: IndexedCollection>(
    uow: &mut UnitOfWork,
    parent: Id<C::Parent>,
    a: i32,
    b: i32,
) -> Result<()> {
    uow.note_lock(C::TABLE);

    let lock_sql = format!(
        "SELECT id FROM {} WHERE {} = $1 AND index IN ($2, $3) ORDER BY id FOR UPDATE",
        C::TABLE.as_str(),
        C::PARENT_COLUMN
    );
    let locked: Vec<i64> = sqlx::query_scalar(&lock_sql)
        .bind(parent)
        .bind(a)
        .bind(b)
        .fetch_all(&mut **uow)
        .await?;

    if a == b || locked.len() < 2 {
        return Err(WorkoutError::not_found(C::ENTITY));
    }

    let swap_sql = format!(
        "UPDATE {} SET index = CASE WHEN index = $2 THEN $3 ELSE $2 END, updated_at = NOW()
         WHERE {} = $1 AND index IN ($2, $3)",
        C::TABLE.as_str(),
        C::PARENT_COLUMN
    );
    sqlx::query(&swap_sql)
        .bind(parent)
        .bind(a)
        .bind(b)
        .execute(&mut **uow)
        .await?;

    Ok(())
}

/// Child counts feeding the completion formula.
#[derive(sqlx::FromRow, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: i64,
    pub pending: i64,
    pub skipped: i64,
}

/// Counts the children of `parent` by status in one pass.
pub async fn status_counts<C: IndexedCollection>(
    parent: Id<C::Parent>,
    conn: &mut PgConnection,
) -> Result<StatusCounts> {
    let sql = format!(
        "SELECT COUNT(*) AS total,
                COUNT(*) FILTER (WHERE completed = false) AS pending,
                COUNT(*) FILTER (WHERE skipped = true) AS skipped
         FROM {} WHERE {} = $1",
        C::TABLE.as_str(),
        C::PARENT_COLUMN
    );
    let counts = sqlx::query_as::<_, StatusCounts>(&sql)
        .bind(parent)
        .fetch_one(conn)
        .await?;
    Ok(counts)
}

/// Where a new child lands given the requested index and the current max.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Append(i32),
    Insert(i32),
}

impl Placement {
    /// Absent, non-positive or past-the-end requests append.
    pub fn resolve(requested: Option<i32>, max: i32) -> Self {
        match requested {
            Some(index) if index >= 1 && index <= max => Self::Insert(index),
            _ => Self::Append(max + 1),
        }
    }

    pub fn index(self) -> i32 {
        match self {
            Self::Append(index) | Self::Insert(index) => index,
        }
    }
}

/// Reserves an index for a new child, shifting later siblings when inserting.
pub async fn insert_position<C: IndexedCollection>(
    parent: Id<C::Parent>,
    requested: Option<i32>,
    conn: &mut PgConnection,
) -> Result<i32> {
    let max = max_index::<C>(parent, &mut *conn).await?;
    let placement = Placement::resolve(requested, max);
    if let Placement::Insert(index) = placement {
        increment_indexes_after::<C>(parent, index, conn).await?;
    }
    Ok(placement.index())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_or_zero_index_appends() {
        assert_eq!(Placement::resolve(None, 3), Placement::Append(4));
        assert_eq!(Placement::resolve(Some(0), 3), Placement::Append(4));
        assert_eq!(Placement::resolve(Some(-2), 0), Placement::Append(1));
    }

    #[test]
    fn test_past_the_end_appends() {
        assert_eq!(Placement::resolve(Some(9), 3), Placement::Append(4));
        assert_eq!(Placement::resolve(Some(1), 0), Placement::Append(1));
    }

    #[test]
    fn test_inside_range_inserts() {
        assert_eq!(Placement::resolve(Some(1), 3), Placement::Insert(1));
        assert_eq!(Placement::resolve(Some(3), 3), Placement::Insert(3));
        assert_eq!(Placement::Insert(2).index(), 2);
    }
}
