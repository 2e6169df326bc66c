//! Inputs accepted and read models returned by the workout use cases.

mod inputs;

use serde::Serialize;

use super::energy::EnergyEstimate;
use super::models::{Workout, WorkoutCycle, WorkoutExercise, WorkoutPlan, WorkoutSet};
use crate::domains::exercises::IndividualExerciseDetails;

pub use inputs::*;

#[derive(Debug, Clone, Serialize)]
pub struct PlanDetails {
    #[serde(flatten)]
    pub plan: WorkoutPlan,
    pub cycles: Vec<WorkoutCycle>,
}

/// Cycle with its workouts ordered by index then id.
#[derive(Debug, Clone, Serialize)]
pub struct CycleWithWorkouts {
    #[serde(flatten)]
    pub cycle: WorkoutCycle,
    pub workouts: Vec<Workout>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutExerciseDetails {
    #[serde(flatten)]
    pub workout_exercise: WorkoutExercise,
    pub individual_exercise: IndividualExerciseDetails,
    /// Ordered by index.
    pub sets: Vec<WorkoutSet>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutDetails {
    #[serde(flatten)]
    pub workout: Workout,
    pub exercises: Vec<WorkoutExerciseDetails>,
}

/// Response of a set status write.
#[derive(Debug, Clone, Serialize)]
pub struct SetCompletion {
    pub set: WorkoutSet,
    pub workout_exercise: WorkoutExercise,
    pub workout: Workout,
    /// Present when the workout completed with this write.
    pub energy: Option<EnergyEstimate>,
}

/// Response of a workout exercise status write.
#[derive(Debug, Clone, Serialize)]
pub struct ExerciseCompletion {
    pub workout_exercise: WorkoutExercise,
    pub sets: Vec<WorkoutSet>,
    pub workout: Workout,
    /// Present when the workout completed with this write.
    pub energy: Option<EnergyEstimate>,
}

/// Response of an explicit cycle completion.
#[derive(Debug, Clone, Serialize)]
pub struct CycleCompletion {
    pub cycle: WorkoutCycle,
    /// The cycle that follows, created on demand when completing the current one.
    pub next_cycle: Option<WorkoutCycle>,
    pub plan: WorkoutPlan,
}
