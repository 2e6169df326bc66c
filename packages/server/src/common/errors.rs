use thiserror::Error;

/// Errors surfaced by the workout core.
///
/// Ownership mismatches are reported as `NotFound`, never as a permission
/// error, so ids cannot be enumerated across users.
#[derive(Error, Debug)]
pub enum WorkoutError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Database error: {0}")]
    Infrastructure(sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T, E = WorkoutError> = std::result::Result<T, E>;

impl WorkoutError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    pub fn precondition(reason: impl Into<String>) -> Self {
        Self::Precondition(reason.into())
    }

    /// HTTP status a transport should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Conflict(_) | Self::Precondition(_) => 409,
            Self::Infrastructure(_) | Self::Internal(_) => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<sqlx::Error> for WorkoutError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::RowNotFound) {
            return Self::NotFound("row".to_string());
        }
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return Self::Conflict(db.constraint().unwrap_or("unique constraint").to_string());
            }
        }
        Self::Infrastructure(err)
    }
}

/// Narrows a generic `NotFound` to the entity the caller was looking for.
pub trait OrNotFound<T> {
    fn or_not_found(self, what: &str) -> Result<T>;
}

impl<T> OrNotFound<T> for Result<T> {
    fn or_not_found(self, what: &str) -> Result<T> {
        self.map_err(|e| match e {
            WorkoutError::NotFound(_) => WorkoutError::NotFound(what.to_string()),
            other => other,
        })
    }
}

/// Turns an absent row into a `NotFound` naming the entity.
pub trait Required<T> {
    fn required(self, what: &str) -> Result<T>;
}

impl<T> Required<T> for Result<Option<T>> {
    fn required(self, what: &str) -> Result<T> {
        self.and_then(|row| row.ok_or_else(|| WorkoutError::NotFound(what.to_string())))
            .or_not_found(what)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: WorkoutError = sqlx::Error::RowNotFound.into();
        assert!(err.is_not_found());
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(WorkoutError::validation("bad").status_code(), 400);
        assert_eq!(WorkoutError::Conflict("dup".into()).status_code(), 409);
        assert_eq!(WorkoutError::precondition("first cycle").status_code(), 409);
        assert_eq!(WorkoutError::from(sqlx::Error::PoolTimedOut).status_code(), 500);
    }

    #[test]
    fn test_or_not_found_names_entity() {
        let missing: Result<Option<i32>> = Ok(None);
        let err = missing.required("workout set").unwrap_err();
        assert_eq!(err.to_string(), "workout set not found");

        let generic: Result<i32> = Err(WorkoutError::not_found("row"));
        let err = generic.or_not_found("individual exercise").unwrap_err();
        assert_eq!(err.to_string(), "individual exercise not found");
    }
}
