//! Workout activities - the use cases of the training tree.
//!
//! Every write opens one unit of work, takes row locks top-down, mutates,
//! dispatches the raised events through the completion cascade and commits.

mod carry_over;
mod chain;
mod cycles;
mod energy_summary;
mod moves;
mod plans;
mod workout_exercises;
mod workout_sets;
mod workouts;

pub use carry_over::{plan_previous_values, PreviousValues};
pub use cycles::{
    complete_workout_cycle, delete_workout_cycle, get_workout_cycle, list_workout_cycles,
    update_workout_cycle,
};
pub use energy_summary::workout_summary;
pub use moves::Direction;
pub use plans::{
    create_workout_plan, delete_workout_plan, get_active_workout_plan, get_workout_plan,
    list_workout_plans, update_workout_plan,
};
pub use workout_exercises::{
    complete_workout_exercise, create_workout_exercise, delete_workout_exercise,
    get_workout_exercise, move_workout_exercise, replace_workout_exercise,
};
pub use workout_sets::{
    complete_workout_set, create_workout_set, delete_workout_set, get_workout_set,
    move_workout_set, update_workout_set,
};
pub use workouts::{
    create_multiple_workouts, create_workout, delete_workout, get_workout, move_workout,
    update_workout,
};
