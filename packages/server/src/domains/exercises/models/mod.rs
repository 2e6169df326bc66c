pub mod exercise;
pub mod individual_exercise;
pub mod muscle_group;

pub use exercise::{slugify, Exercise, NewExercise};
pub use individual_exercise::{IndividualExercise, IndividualExerciseDetails, PerformanceRecord};
pub use muscle_group::MuscleGroup;
