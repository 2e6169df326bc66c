use crate::common::Result;
use crate::domains::workouts::energy::EnergyEstimate;
use crate::domains::workouts::models::Workout;
use crate::domains::workouts::summary::{estimate_workout, recompute_summary};
use crate::kernel::persistence::WorkoutPath;
use crate::kernel::ServerDeps;

use super::chain::lock_workout_chain;

/// Energy estimate of a workout from what has been performed so far.
///
/// Completed workouts also get the estimate persisted.
pub async fn workout_summary(path: WorkoutPath, deps: &ServerDeps) -> Result<EnergyEstimate> {
    let mut uow = deps.unit_of_work.begin().await?;
    let workout: Workout = lock_workout_chain(&mut uow, &path).await?;

    let estimate = if workout.completed {
        recompute_summary(path.user_id, workout.id, &deps.estimator, &mut uow).await?
    } else {
        estimate_workout(path.user_id, workout.id, &deps.estimator, &mut uow).await?
    };

    uow.commit().await?;
    Ok(estimate)
}
