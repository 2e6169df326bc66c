use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgConnection;

use crate::common::{MuscleGroupId, Result, WorkoutError};

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize)]
pub struct MuscleGroup {
    pub id: MuscleGroupId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MuscleGroup {
    pub async fn insert(name: &str, conn: &mut PgConnection) -> Result<Self> {
        sqlx::query_as::<_, Self>("INSERT INTO muscle_groups (name) VALUES ($1) RETURNING *")
            .bind(name)
            .fetch_one(conn)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_id(id: MuscleGroupId, conn: &mut PgConnection) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM muscle_groups WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| WorkoutError::not_found("muscle group"))
    }

    pub async fn find_all(conn: &mut PgConnection) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM muscle_groups ORDER BY name")
            .fetch_all(conn)
            .await
            .map_err(Into::into)
    }
}
