use chrono::{DateTime, Utc};
use serde::Deserialize;
use typed_builder::TypedBuilder;

use crate::common::{IndividualExerciseId, Result, WorkoutError};
use crate::domains::exercises::IndividualExerciseInput;

/// Bounds on the number of sets a workout exercise is created with.
pub const MIN_SETS_QT: i32 = 1;
pub const MAX_SETS_QT: i32 = 20;

#[derive(Debug, Clone, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct NewWorkoutPlan {
    pub name: String,
    #[builder(default)]
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, Default, Deserialize, TypedBuilder)]
#[builder(field_defaults(default, setter(into)))]
pub struct WorkoutPlanUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct WorkoutInput {
    pub name: String,
    /// Absent, zero or past the end appends.
    #[builder(default)]
    #[serde(default)]
    pub index: Option<i32>,
    #[builder(default)]
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, TypedBuilder)]
#[builder(field_defaults(default, setter(into)))]
pub struct WorkoutUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// Which individual exercise a new workout exercise uses.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseChoice {
    Existing(IndividualExerciseId),
    Lookup(IndividualExerciseInput),
}

#[derive(Debug, Clone, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct WorkoutExerciseInput {
    pub exercise: ExerciseChoice,
    pub sets_qt: i32,
    #[builder(default)]
    #[serde(default)]
    pub index: Option<i32>,
}

impl WorkoutExerciseInput {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_SETS_QT..=MAX_SETS_QT).contains(&self.sets_qt) {
            return Err(WorkoutError::validation(format!(
                "sets_qt must be between {MIN_SETS_QT} and {MAX_SETS_QT}, got {}",
                self.sets_qt
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, TypedBuilder)]
#[builder(field_defaults(default, setter(into)))]
pub struct WorkoutSetInput {
    #[serde(default)]
    pub index: Option<i32>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub reps: Option<i32>,
}

impl WorkoutSetInput {
    pub fn validate(&self) -> Result<()> {
        validate_values(self.weight, self.reps)
    }
}

#[derive(Debug, Clone, Default, Deserialize, TypedBuilder)]
#[builder(field_defaults(default, setter(into)))]
pub struct WorkoutSetUpdate {
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub reps: Option<i32>,
}

impl WorkoutSetUpdate {
    pub fn validate(&self) -> Result<()> {
        validate_values(self.weight, self.reps)
    }
}

fn validate_values(weight: Option<f64>, reps: Option<i32>) -> Result<()> {
    if weight.is_some_and(|w| !w.is_finite() || w < 0.0) {
        return Err(WorkoutError::validation("weight must be a non-negative number"));
    }
    if reps.is_some_and(|r| r < 0) {
        return Err(WorkoutError::validation("reps must not be negative"));
    }
    Ok(())
}

/// Trimmed, non-empty name.
pub(crate) fn required_name<'a>(name: &'a str, what: &str) -> Result<&'a str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(WorkoutError::validation(format!("{what} is required")));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise_input(sets_qt: i32) -> WorkoutExerciseInput {
        WorkoutExerciseInput::builder()
            .exercise(ExerciseChoice::Existing(IndividualExerciseId::new(1)))
            .sets_qt(sets_qt)
            .build()
    }

    #[test]
    fn test_sets_qt_bounds() {
        assert!(exercise_input(1).validate().is_ok());
        assert!(exercise_input(20).validate().is_ok());
        assert!(matches!(exercise_input(0).validate(), Err(WorkoutError::Validation(_))));
        assert!(matches!(exercise_input(21).validate(), Err(WorkoutError::Validation(_))));
    }

    #[test]
    fn test_set_values_must_be_non_negative() {
        let ok = WorkoutSetUpdate::builder().weight(Some(0.0)).reps(Some(0)).build();
        assert!(ok.validate().is_ok());

        let negative = WorkoutSetUpdate::builder().weight(Some(-2.5)).build();
        assert!(negative.validate().is_err());

        let nan = WorkoutSetInput::builder().weight(Some(f64::NAN)).build();
        assert!(nan.validate().is_err());

        let reps = WorkoutSetInput::builder().reps(Some(-1)).build();
        assert!(reps.validate().is_err());
    }

    #[test]
    fn test_required_name_trims() {
        assert_eq!(required_name("  Push day ", "workout name").unwrap(), "Push day");
        let err = required_name("   ", "workout name").unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: workout name is required");
    }

    #[test]
    fn test_exercise_choice_deserializes() {
        let existing: ExerciseChoice = serde_json::from_str(r#"{"existing": 7}"#).unwrap();
        assert!(matches!(existing, ExerciseChoice::Existing(id) if id == IndividualExerciseId::new(7)));

        let lookup: ExerciseChoice =
            serde_json::from_str(r#"{"lookup": {"name": "Row", "muscle_group_id": 2}}"#).unwrap();
        match lookup {
            ExerciseChoice::Lookup(input) => assert_eq!(input.name.as_deref(), Some("Row")),
            other => panic!("unexpected choice {other:?}"),
        }
    }
}
