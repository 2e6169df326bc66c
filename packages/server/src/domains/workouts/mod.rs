pub mod activities;
pub mod data;
pub mod effects;
pub mod energy;
pub mod events;
pub mod models;
pub mod summary;

pub use activities::*;
pub use data::*;
pub use energy::{EnergyEstimate, EnergyEstimator};
pub use events::WorkoutEvent;
pub use models::*;
