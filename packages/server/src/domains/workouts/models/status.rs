use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::{Result, WorkoutError};
use crate::kernel::persistence::StatusCounts;

/// Status a set is written to.
///
/// Stored as two flags: pending `(false, false)`, completed `(true, false)`,
/// skipped `(true, true)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetStatus {
    Pending,
    Completed,
    Skipped,
}

impl SetStatus {
    pub fn flags(self) -> CompletionFlags {
        match self {
            Self::Pending => CompletionFlags::PENDING,
            Self::Completed => CompletionFlags {
                completed: true,
                skipped: false,
            },
            Self::Skipped => CompletionFlags {
                completed: true,
                skipped: true,
            },
        }
    }
}

/// `completed = true/false` from older clients.
impl From<bool> for SetStatus {
    fn from(completed: bool) -> Self {
        if completed {
            Self::Completed
        } else {
            Self::Pending
        }
    }
}

impl FromStr for SetStatus {
    type Err = WorkoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "skipped" => Ok(Self::Skipped),
            other => Err(WorkoutError::validation(format!(
                "status must be pending, completed or skipped, got {other:?}"
            ))),
        }
    }
}

/// Derived `{completed, skipped}` pair of any node above a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompletionFlags {
    pub completed: bool,
    pub skipped: bool,
}

impl CompletionFlags {
    pub const PENDING: Self = Self {
        completed: false,
        skipped: false,
    };

    /// `completed` when every child is done, `skipped` when every child was
    /// skipped. An empty parent stays pending.
    pub fn derive(counts: &StatusCounts) -> Self {
        let completed = counts.total > 0 && counts.pending == 0;
        Self {
            completed,
            skipped: completed && counts.skipped == counts.total,
        }
    }

    pub fn of(completed: bool, skipped: bool) -> Self {
        Self { completed, skipped }
    }

    /// Completed with at least one child actually performed.
    pub fn performed(self) -> bool {
        self.completed && !self.skipped
    }
}
