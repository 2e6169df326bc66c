//! Typed ID definitions for all domain entities.
//!
//! ```rust
//! use logbook_core::common::{WorkoutId, WorkoutSetId};
//!
//! let workout_id = WorkoutId::new(1);
//! let set_id = WorkoutSetId::new(1);
//!
//! // This would be a compile error:
//! // let wrong: WorkoutSetId = workout_id;
//! # let _ = (workout_id, set_id);
//! ```

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for users (owned by the identity service).
pub struct User;

/// Marker type for catalog muscle groups.
pub struct MuscleGroup;

/// Marker type for catalog exercises.
pub struct Exercise;

/// Marker type for a user's instantiation of an exercise.
pub struct IndividualExercise;

/// Marker type for training plans.
pub struct WorkoutPlan;

/// Marker type for weekly cycles inside a plan.
pub struct WorkoutCycle;

/// Marker type for workouts inside a cycle.
pub struct Workout;

/// Marker type for exercise slots inside a workout.
pub struct WorkoutExercise;

/// Marker type for sets inside a workout exercise.
pub struct WorkoutSet;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

pub type UserId = Id<User>;
pub type MuscleGroupId = Id<MuscleGroup>;
pub type ExerciseId = Id<Exercise>;
pub type IndividualExerciseId = Id<IndividualExercise>;
pub type PlanId = Id<WorkoutPlan>;
pub type CycleId = Id<WorkoutCycle>;
pub type WorkoutId = Id<Workout>;
pub type WorkoutExerciseId = Id<WorkoutExercise>;
pub type WorkoutSetId = Id<WorkoutSet>;
