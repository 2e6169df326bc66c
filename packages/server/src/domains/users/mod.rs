pub mod models;

pub use models::user_profile::{Sex, UserProfile};
