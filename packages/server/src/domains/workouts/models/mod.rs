pub mod cycle;
pub mod plan;
pub mod status;
pub mod workout;
pub mod workout_exercise;
pub mod workout_set;

pub use cycle::{week_name, WorkoutCycle};
pub use plan::WorkoutPlan;
pub use status::{CompletionFlags, SetStatus};
pub use workout::{NewWorkout, StatusTransition, Workout};
pub use workout_exercise::WorkoutExercise;
pub use workout_set::{NewWorkoutSet, WorkoutSet};
