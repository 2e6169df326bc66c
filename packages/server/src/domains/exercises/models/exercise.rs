use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use typed_builder::TypedBuilder;

use crate::common::{ExerciseId, MuscleGroupId, Result, WorkoutError};

/// Shared catalog exercise.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize)]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
    pub slug: String,
    pub is_bodyweight: bool,
    pub is_time_based: bool,
    pub muscle_group_id: Option<MuscleGroupId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct NewExercise {
    pub name: String,
    /// Derived from `name` when absent.
    #[builder(default)]
    #[serde(default)]
    pub slug: Option<String>,
    #[builder(default)]
    #[serde(default)]
    pub is_bodyweight: bool,
    #[builder(default)]
    #[serde(default)]
    pub is_time_based: bool,
    #[builder(default)]
    #[serde(default)]
    pub muscle_group_id: Option<MuscleGroupId>,
}

/// Lowercase ASCII words joined by single dashes.
///
/// `"Bench Press (Barbell)"` becomes `"bench-press-barbell"`.
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

impl Exercise {
    pub async fn insert(new: &NewExercise, conn: &mut PgConnection) -> Result<Self> {
        let slug = match new.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => slug.to_string(),
            _ => slugify(&new.name),
        };
        if slug.is_empty() {
            return Err(WorkoutError::validation("exercise name has no usable characters"));
        }

        sqlx::query_as::<_, Self>(
            "INSERT INTO exercises (name, slug, is_bodyweight, is_time_based, muscle_group_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(new.name.trim())
        .bind(slug)
        .bind(new.is_bodyweight)
        .bind(new.is_time_based)
        .bind(new.muscle_group_id)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: ExerciseId, conn: &mut PgConnection) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM exercises WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| WorkoutError::not_found("exercise"))
    }

    pub async fn find_all(conn: &mut PgConnection) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM exercises ORDER BY name")
            .fetch_all(conn)
            .await
            .map_err(Into::into)
    }
}
