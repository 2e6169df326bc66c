//! Workout energy summary: load what was performed, estimate, persist.

use chrono::Utc;
use sqlx::PgConnection;
use tracing::debug;

use super::energy::{EnergyEstimate, EnergyEstimator, ExerciseSample, SetSample};
use super::models::Workout;
use crate::common::{Result, UserId, WorkoutExerciseId, WorkoutId};
use crate::domains::users::UserProfile;

#[derive(sqlx::FromRow, Debug)]
struct PerformedSetRow {
    workout_exercise_id: WorkoutExerciseId,
    time_based: bool,
    weight: Option<f64>,
    reps: Option<i32>,
}

/// Completed, non-skipped sets of completed, non-skipped slots, grouped per slot.
pub async fn load_samples(
    workout_id: WorkoutId,
    conn: &mut PgConnection,
) -> Result<Vec<ExerciseSample>> {
    let rows = sqlx::query_as::<_, PerformedSetRow>(
        "SELECT we.id AS workout_exercise_id,
                COALESCE(e.is_time_based, false) AS time_based,
                s.weight,
                s.reps
         FROM workout_exercises we
         JOIN individual_exercises ie ON ie.id = we.individual_exercise_id
         LEFT JOIN exercises e ON e.id = ie.exercise_id
         JOIN workout_sets s ON s.workout_exercise_id = we.id
         WHERE we.workout_id = $1
           AND we.completed AND NOT we.skipped
           AND s.completed AND NOT s.skipped
         ORDER BY we.index, we.id, s.index, s.id",
    )
    .bind(workout_id)
    .fetch_all(conn)
    .await?;

    Ok(group_samples(rows))
}

fn group_samples(rows: Vec<PerformedSetRow>) -> Vec<ExerciseSample> {
    let mut samples: Vec<ExerciseSample> = Vec::new();
    let mut current: Option<WorkoutExerciseId> = None;

    for row in rows {
        if current != Some(row.workout_exercise_id) {
            current = Some(row.workout_exercise_id);
            samples.push(ExerciseSample {
                time_based: row.time_based,
                sets: Vec::new(),
            });
        }
        if let Some(sample) = samples.last_mut() {
            sample.sets.push(SetSample {
                weight: row.weight,
                reps: row.reps,
            });
        }
    }

    samples
}

/// Estimate `workout_id` from its current tree without persisting.
pub async fn estimate_workout(
    user_id: UserId,
    workout_id: WorkoutId,
    estimator: &EnergyEstimator,
    conn: &mut PgConnection,
) -> Result<EnergyEstimate> {
    let profile = UserProfile::find_by_id(user_id, &mut *conn).await?;
    let today = Utc::now().date_naive();
    let athlete = match &profile {
        Some(p) => estimator.athlete(p.weight_kg, p.age_on(today), p.sex()),
        None => estimator.athlete(None, None, None),
    };

    let samples = load_samples(workout_id, conn).await?;
    Ok(estimator.estimate(&athlete, &samples))
}

/// Recompute and persist the energy summary of `workout_id`.
///
/// Safe to repeat: the result only depends on the current tree.
pub async fn recompute_summary(
    user_id: UserId,
    workout_id: WorkoutId,
    estimator: &EnergyEstimator,
    conn: &mut PgConnection,
) -> Result<EnergyEstimate> {
    let estimate = estimate_workout(user_id, workout_id, estimator, &mut *conn).await?;
    Workout::save_summary(workout_id, &estimate, conn).await?;

    debug!(
        workout_id = %workout_id,
        calories = estimate.calories,
        "Workout summary recomputed"
    );
    Ok(estimate)
}
