// Common types and utilities shared across the application

pub mod entity_ids;
pub mod errors;
pub mod id;

pub use entity_ids::*;
pub use errors::{OrNotFound, Required, Result, WorkoutError};
pub use id::Id;
