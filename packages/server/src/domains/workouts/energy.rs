//! Energy estimation for a completed workout.
//!
//! Each completed workout exercise contributes
//!
//! ```text
//! kcal = 0.0175 · avgMET · W · activeMin + 0.0175 · 1.8 · W · restMin
//! kcal *= 1.1 (overhead) * 1.2 (EPOC) * age factor * sex factor
//! ```
//!
//! rounded to 0.1, where `W` is body weight in kg, `avgMET` the mean of the
//! per-set METs and `restMin` the rest taken between consecutive sets.

use serde::{Deserialize, Serialize};

use crate::domains::users::Sex;

pub const DEFAULT_USER_WEIGHT_KG: f64 = 70.0;

const REST_SECONDS_RESISTANCE: f64 = 105.0;
const REST_SECONDS_TIME_BASED: f64 = 60.0;
const MIN_ACTIVE_SECONDS: f64 = 15.0;
const SECONDS_PER_REP: f64 = 3.0;
const MET_FLOOR: f64 = 3.0;
const MET_CEILING: f64 = 9.0;
const REST_MET: f64 = 1.8;
const KCAL_PER_MET_KG_MINUTE: f64 = 0.0175;
const OVERHEAD: f64 = 1.1;
const EPOC: f64 = 1.2;

/// The person doing the work.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Athlete {
    pub weight_kg: f64,
    pub age: Option<i32>,
    pub sex: Option<Sex>,
}

/// A logged set. For time-based exercises `reps` holds seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SetSample {
    pub weight: Option<f64>,
    pub reps: Option<i32>,
}

/// The completed sets of one workout exercise.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExerciseSample {
    pub time_based: bool,
    pub sets: Vec<SetSample>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnergyEstimate {
    pub calories: f64,
    pub active_minutes: f64,
    pub rest_minutes: f64,
}

#[derive(Debug, Clone)]
pub struct EnergyEstimator {
    default_weight_kg: f64,
}

impl Default for EnergyEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_USER_WEIGHT_KG)
    }
}

impl EnergyEstimator {
    pub fn new(default_weight_kg: f64) -> Self {
        Self { default_weight_kg }
    }

    /// Builds an athlete, falling back to the default weight.
    pub fn athlete(&self, weight_kg: Option<f64>, age: Option<i32>, sex: Option<Sex>) -> Athlete {
        Athlete {
            weight_kg: weight_kg
                .filter(|w| *w > 0.0)
                .unwrap_or(self.default_weight_kg),
            age,
            sex,
        }
    }

    pub fn estimate(&self, athlete: &Athlete, exercises: &[ExerciseSample]) -> EnergyEstimate {
        let mut total = EnergyEstimate::default();

        for exercise in exercises.iter().filter(|e| !e.sets.is_empty()) {
            let part = estimate_exercise(athlete, exercise);
            total.calories += part.calories;
            total.active_minutes += part.active_minutes;
            total.rest_minutes += part.rest_minutes;
        }

        EnergyEstimate {
            calories: round_tenth(total.calories),
            active_minutes: round_tenth(total.active_minutes),
            rest_minutes: round_tenth(total.rest_minutes),
        }
    }
}

fn estimate_exercise(athlete: &Athlete, exercise: &ExerciseSample) -> EnergyEstimate {
    let weight = athlete.weight_kg;
    let sets = exercise.sets.len() as f64;

    let active_seconds: f64 = exercise
        .sets
        .iter()
        .map(|s| active_seconds(exercise.time_based, s.reps))
        .sum();
    let avg_met = exercise
        .sets
        .iter()
        .map(|s| set_met(exercise.time_based, s, weight))
        .sum::<f64>()
        / sets;

    let rest_seconds = if exercise.time_based {
        REST_SECONDS_TIME_BASED
    } else {
        REST_SECONDS_RESISTANCE
    } * (sets - 1.0);

    let active_minutes = active_seconds / 60.0;
    let rest_minutes = rest_seconds / 60.0;

    let kcal = KCAL_PER_MET_KG_MINUTE * avg_met * weight * active_minutes
        + KCAL_PER_MET_KG_MINUTE * REST_MET * weight * rest_minutes;
    let kcal = kcal * OVERHEAD * EPOC * adjustment(athlete);

    EnergyEstimate {
        calories: round_tenth(kcal),
        active_minutes,
        rest_minutes,
    }
}

fn active_seconds(time_based: bool, reps: Option<i32>) -> f64 {
    let reps = f64::from(reps.unwrap_or(0).max(0));
    let seconds = if time_based { reps } else { reps * SECONDS_PER_REP };
    seconds.max(MIN_ACTIVE_SECONDS)
}

fn set_met(time_based: bool, set: &SetSample, user_weight: f64) -> f64 {
    let reps = set.reps.unwrap_or(0);

    let met: f64 = if time_based {
        match reps {
            r if r >= 45 => 6.0,
            r if r >= 20 => 5.5,
            _ => 5.0,
        }
    } else {
        let ratio = set.weight.unwrap_or(0.0) / user_weight;
        let base = if ratio < 0.3 {
            4.0
        } else if ratio < 0.6 {
            5.0
        } else {
            6.0
        };
        if reps >= 12 {
            base + 0.5
        } else {
            base
        }
    };

    met.clamp(MET_FLOOR, MET_CEILING)
}

fn adjustment(athlete: &Athlete) -> f64 {
    let age = match athlete.age {
        Some(age) if age < 25 => 1.05,
        Some(age) if age > 50 => 0.90,
        _ => 1.0,
    };
    let sex = match athlete.sex {
        Some(Sex::Male) => 1.05,
        Some(Sex::Female) => 0.95,
        None => 1.0,
    };
    age * sex
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn athlete(weight_kg: f64) -> Athlete {
        Athlete {
            weight_kg,
            age: None,
            sex: None,
        }
    }

    fn sets(n: usize, weight: f64, reps: i32) -> Vec<SetSample> {
        vec![
            SetSample {
                weight: Some(weight),
                reps: Some(reps),
            };
            n
        ]
    }

    #[test]
    fn test_rep_based_exercise() {
        let estimator = EnergyEstimator::default();
        let bench = ExerciseSample {
            time_based: false,
            sets: sets(3, 50.0, 10),
        };

        let estimate = estimator.estimate(&athlete(70.0), &[bench]);

        assert_eq!(estimate.calories, 24.7);
        assert_eq!(estimate.active_minutes, 1.5);
        assert_eq!(estimate.rest_minutes, 3.5);
    }

    #[test]
    fn test_time_based_single_set() {
        let estimator = EnergyEstimator::default();
        let plank = ExerciseSample {
            time_based: true,
            sets: vec![SetSample {
                weight: None,
                reps: Some(30),
            }],
        };

        let estimate = estimator.estimate(&athlete(80.0), &[plank.clone()]);
        assert_eq!(estimate.calories, 5.1);
        assert_eq!(estimate.rest_minutes, 0.0);

        let young_man = Athlete {
            weight_kg: 80.0,
            age: Some(22),
            sex: Some(Sex::Male),
        };
        assert_eq!(estimator.estimate(&young_man, &[plank]).calories, 5.6);
    }

    #[test]
    fn test_met_thresholds() {
        let light = SetSample {
            weight: Some(10.0),
            reps: Some(8),
        };
        let heavy_high_reps = SetSample {
            weight: Some(60.0),
            reps: Some(12),
        };
        assert_eq!(set_met(false, &light, 70.0), 4.0);
        assert_eq!(set_met(false, &heavy_high_reps, 70.0), 6.5);

        let short = SetSample {
            weight: None,
            reps: Some(10),
        };
        let long = SetSample {
            weight: None,
            reps: Some(45),
        };
        assert_eq!(set_met(true, &short, 70.0), 5.0);
        assert_eq!(set_met(true, &long, 70.0), 6.0);
    }

    #[test]
    fn test_active_seconds_floor() {
        assert_eq!(active_seconds(false, Some(2)), 15.0);
        assert_eq!(active_seconds(false, None), 15.0);
        assert_eq!(active_seconds(true, Some(40)), 40.0);
    }

    #[test]
    fn test_adjustments() {
        let older_woman = Athlete {
            weight_kg: 60.0,
            age: Some(55),
            sex: Some(Sex::Female),
        };
        assert!((adjustment(&older_woman) - 0.855).abs() < 1e-9);
        assert_eq!(adjustment(&athlete(60.0)), 1.0);
    }

    #[test]
    fn test_missing_weight_uses_default() {
        let estimator = EnergyEstimator::new(75.0);
        assert_eq!(estimator.athlete(None, None, None).weight_kg, 75.0);
        assert_eq!(estimator.athlete(Some(0.0), None, None).weight_kg, 75.0);
        assert_eq!(estimator.athlete(Some(90.0), None, None).weight_kg, 90.0);
    }

    #[test]
    fn test_exercises_without_sets_contribute_nothing() {
        let estimator = EnergyEstimator::default();
        let empty = ExerciseSample::default();
        assert_eq!(
            estimator.estimate(&athlete(70.0), &[empty]),
            EnergyEstimate::default()
        );
    }
}
