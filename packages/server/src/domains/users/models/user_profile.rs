use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use crate::common::{Result, UserId, WorkoutError};

/// Read-only view of the profile fields the energy estimator needs.
///
/// Users are registered by the identity service; this crate never writes them.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct UserProfile {
    pub id: UserId,
    pub weight_kg: Option<f64>,
    pub birth_date: Option<NaiveDate>,
    pub sex: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl FromStr for Sex {
    type Err = WorkoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            other => Err(WorkoutError::validation(format!("unknown sex {other:?}"))),
        }
    }
}

impl UserProfile {
    pub async fn find_by_id(id: UserId, conn: &mut PgConnection) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, weight_kg, birth_date, sex FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    /// Whole years between `birth_date` and `today`.
    pub fn age_on(&self, today: NaiveDate) -> Option<i32> {
        let born = self.birth_date?;
        let mut age = today.year() - born.year();
        if (today.month(), today.day()) < (born.month(), born.day()) {
            age -= 1;
        }
        Some(age)
    }

    /// Unknown values read as "not provided".
    pub fn sex(&self) -> Option<Sex> {
        self.sex.as_deref().and_then(|s| s.parse().ok())
    }
}
