// Strength-training logbook - workout core
//
// Plans, weekly cycles, workouts, exercise slots and sets owned by a user,
// with completion flags derived bottom-up by a transactional event cascade.
//
// Use cases live in domains/*/activities; infrastructure in kernel/.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
