//! Carry-over of prior performance into newly planned sets and cycles.

use chrono::{Duration, Utc};
use tracing::info;

use crate::common::{IndividualExerciseId, Result, UserId, WorkoutExerciseId, WorkoutId};
use crate::domains::workouts::models::{
    NewWorkout, NewWorkoutSet, Workout, WorkoutCycle, WorkoutExercise, WorkoutSet,
};
use crate::kernel::UnitOfWork;

/// Weight and reps a new set is planned from.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PreviousValues {
    pub weight: Option<f64>,
    pub reps: Option<i32>,
}

impl PreviousValues {
    /// Logged values, or the set's own planned values where nothing was logged.
    pub fn of(set: &WorkoutSet) -> Self {
        Self {
            weight: set.weight.or(set.previous_weight),
            reps: set.reps.or(set.previous_reps),
        }
    }
}

/// Previous values for `count` new sets: set `i` copies prior set `i`, or the
/// last prior set when there are fewer.
pub fn plan_previous_values(prior: &[PreviousValues], count: usize) -> Vec<PreviousValues> {
    (0..count)
        .map(|i| prior.get(i).or(prior.last()).copied().unwrap_or_default())
        .collect()
}

/// Previous values for sets `1..=count` of a slot planned from `source`.
pub(crate) async fn prior_values(
    uow: &mut UnitOfWork,
    user_id: UserId,
    source: Option<WorkoutExerciseId>,
    count: usize,
) -> Result<Vec<PreviousValues>> {
    let prior = match source {
        Some(source) => WorkoutSet::find_prior(user_id, source, count as i64, uow).await?,
        None => Vec::new(),
    };
    let prior: Vec<_> = prior.iter().map(PreviousValues::of).collect();
    Ok(plan_previous_values(&prior, count))
}

/// Inserts a workout exercise with `sets_qt` pending sets planned from the
/// slot `source`.
pub(crate) async fn insert_planned_exercise(
    uow: &mut UnitOfWork,
    user_id: UserId,
    workout_id: WorkoutId,
    index: i32,
    individual_exercise_id: IndividualExerciseId,
    source: Option<WorkoutExerciseId>,
    sets_qt: i32,
) -> Result<WorkoutExercise> {
    let values = prior_values(uow, user_id, source, sets_qt as usize).await?;
    let exercise =
        WorkoutExercise::insert(workout_id, index, individual_exercise_id, source, uow).await?;

    for (offset, previous) in values.into_iter().enumerate() {
        let new = NewWorkoutSet::builder()
            .workout_exercise_id(exercise.id)
            .index(offset as i32 + 1)
            .previous_weight(previous.weight)
            .previous_reps(previous.reps)
            .build();
        WorkoutSet::insert(&new, uow).await?;
    }
    Ok(exercise)
}

/// Deep-clones the workouts of `source` into the empty cycle `target`.
///
/// Clones keep their index, start pending, are dated `index` days from now
/// and point back at what they were cloned from. Returns the number of workouts created.
pub(crate) async fn clone_previous_cycle(
    uow: &mut UnitOfWork,
    source: &WorkoutCycle,
    target: &WorkoutCycle,
) -> Result<usize> {
    let workouts = Workout::find_by_cycle(source.id, uow).await?;
    let now = Utc::now();

    for workout in &workouts {
        let date = now + Duration::days(i64::from(workout.index));
        let new = NewWorkout::builder()
            .workout_cycle_id(target.id)
            .name(workout.name.clone())
            .index(workout.index)
            .date(Some(date))
            .previous_workout_id(Some(workout.id))
            .build();
        let clone = Workout::insert(&new, uow).await?;

        for exercise in WorkoutExercise::find_by_workout(workout.id, uow).await? {
            let copy = WorkoutExercise::insert(
                clone.id,
                exercise.index,
                exercise.individual_exercise_id,
                Some(exercise.id),
                uow,
            )
            .await?;
            WorkoutSet::clone_into(exercise.id, copy.id, uow).await?;
        }
    }

    info!(
        source_cycle_id = %source.id,
        target_cycle_id = %target.id,
        workouts = workouts.len(),
        "Cycle planned from previous week"
    );
    Ok(workouts.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(weight: f64, reps: i32) -> PreviousValues {
        PreviousValues {
            weight: Some(weight),
            reps: Some(reps),
        }
    }

    #[test]
    fn test_shorter_prior_repeats_last_set() {
        let prior = [values(60.0, 10), values(65.0, 8)];
        let planned = plan_previous_values(&prior, 4);

        assert_eq!(planned, vec![values(60.0, 10), values(65.0, 8), values(65.0, 8), values(65.0, 8)]);
    }

    #[test]
    fn test_longer_prior_truncates() {
        let prior = [values(60.0, 10), values(65.0, 8), values(70.0, 6)];
        assert_eq!(plan_previous_values(&prior, 2), vec![values(60.0, 10), values(65.0, 8)]);
    }

    #[test]
    fn test_no_prior_plans_empty_values() {
        let planned = plan_previous_values(&[], 3);
        assert_eq!(planned, vec![PreviousValues::default(); 3]);
    }
}
