pub mod activities;
pub mod models;

pub use activities::*;
pub use models::{
    slugify, Exercise, IndividualExercise, IndividualExerciseDetails, MuscleGroup, NewExercise,
    PerformanceRecord,
};
