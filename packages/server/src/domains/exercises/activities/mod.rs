//! Exercise activities - catalog administration and per-user exercises.

mod catalog;
mod individual_exercises;

pub use catalog::{create_exercise, create_muscle_group, get_exercise, list_exercises, list_muscle_groups};
pub use individual_exercises::{
    get_individual_exercise, get_or_create_individual_exercise, individual_exercise_history,
    list_individual_exercises, IndividualExerciseInput,
};
