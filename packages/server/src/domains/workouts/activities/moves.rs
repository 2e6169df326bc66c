use std::str::FromStr;

use serde::Deserialize;

use crate::common::{Result, WorkoutError};

/// Direction of a move: `Up` swaps with the previous index, `Down` with the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Index of the neighbour to swap with.
    pub fn target(self, index: i32) -> Result<i32> {
        let target = match self {
            Self::Up => index - 1,
            Self::Down => index + 1,
        };
        if target < 1 {
            return Err(WorkoutError::validation(format!(
                "cannot move {self:?} from index {index}"
            )));
        }
        Ok(target)
    }
}

impl FromStr for Direction {
    type Err = WorkoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(WorkoutError::validation(format!(
                "direction must be up or down, got {other:?}"
            ))),
        }
    }
}
