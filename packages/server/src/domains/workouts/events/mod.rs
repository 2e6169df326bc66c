use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{CycleId, UserId, WorkoutExerciseId, WorkoutId};
use crate::kernel::DomainEvent;

/// Workout domain events - FACT EVENTS ONLY
///
/// The four `*StatusChanged` events drive the completion cascade inside the
/// writer's transaction. `WorkoutCompleted` is raised by the cascade and
/// only acted upon after commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkoutEvent {
    /// A set under this workout exercise was created, deleted or changed status.
    WorkoutSetStatusChanged {
        user_id: UserId,
        workout_exercise_id: WorkoutExerciseId,
    },

    /// A workout exercise under this workout changed status or membership.
    WorkoutExerciseStatusChanged { user_id: UserId, workout_id: WorkoutId },

    /// Derived flags for a workout, to be persisted.
    WorkoutStatusChanged {
        user_id: UserId,
        workout_id: WorkoutId,
        completed: bool,
        skipped: bool,
    },

    /// A workout under this cycle changed status or membership.
    WorkoutCycleStatusChanged { user_id: UserId, cycle_id: CycleId },

    /// A workout transitioned from pending to completed.
    WorkoutCompleted {
        event_id: Uuid,
        user_id: UserId,
        workout_id: WorkoutId,
        at: DateTime<Utc>,
        /// True the first time this workout was ever completed.
        first: bool,
    },
}

impl WorkoutEvent {
    pub const SET_STATUS_CHANGED: &'static str = "WorkoutSetStatusChanged";
    pub const EXERCISE_STATUS_CHANGED: &'static str = "WorkoutExerciseStatusChanged";
    pub const WORKOUT_STATUS_CHANGED: &'static str = "WorkoutStatusChanged";
    pub const CYCLE_STATUS_CHANGED: &'static str = "WorkoutCycleStatusChanged";
    pub const WORKOUT_COMPLETED: &'static str = "WorkoutCompleted";

    pub fn workout_completed(user_id: UserId, workout_id: WorkoutId, first: bool) -> Self {
        Self::WorkoutCompleted {
            event_id: Uuid::new_v4(),
            user_id,
            workout_id,
            at: Utc::now(),
            first,
        }
    }

    pub fn user_id(&self) -> UserId {
        match self {
            Self::WorkoutSetStatusChanged { user_id, .. }
            | Self::WorkoutExerciseStatusChanged { user_id, .. }
            | Self::WorkoutStatusChanged { user_id, .. }
            | Self::WorkoutCycleStatusChanged { user_id, .. }
            | Self::WorkoutCompleted { user_id, .. } => *user_id,
        }
    }
}

impl DomainEvent for WorkoutEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::WorkoutSetStatusChanged { .. } => Self::SET_STATUS_CHANGED,
            Self::WorkoutExerciseStatusChanged { .. } => Self::EXERCISE_STATUS_CHANGED,
            Self::WorkoutStatusChanged { .. } => Self::WORKOUT_STATUS_CHANGED,
            Self::WorkoutCycleStatusChanged { .. } => Self::CYCLE_STATUS_CHANGED,
            Self::WorkoutCompleted { .. } => Self::WORKOUT_COMPLETED,
        }
    }
}

/// Events raised by an aggregate and not yet handed to the dispatcher.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingEvents(Vec<WorkoutEvent>);

impl PendingEvents {
    pub fn raise(&mut self, event: WorkoutEvent) {
        self.0.push(event);
    }

    /// Takes every pending event, leaving the buffer empty.
    pub fn drain(&mut self) -> Vec<WorkoutEvent> {
        std::mem::take(&mut self.0)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_names() {
        let event = WorkoutEvent::WorkoutCycleStatusChanged {
            user_id: UserId::new(1),
            cycle_id: CycleId::new(2),
        };
        assert_eq!(event.event_type(), "WorkoutCycleStatusChanged");

        let completed = WorkoutEvent::workout_completed(UserId::new(1), WorkoutId::new(3), true);
        assert_eq!(completed.event_type(), WorkoutEvent::WORKOUT_COMPLETED);
        assert_eq!(completed.user_id(), UserId::new(1));
    }

    #[test]
    fn test_completed_events_get_fresh_ids() {
        let a = WorkoutEvent::workout_completed(UserId::new(1), WorkoutId::new(3), true);
        let b = WorkoutEvent::workout_completed(UserId::new(1), WorkoutId::new(3), true);
        assert_ne!(a, b);
    }

    #[test]
    fn test_drain_empties_buffer() {
        let mut pending = PendingEvents::default();
        pending.raise(WorkoutEvent::WorkoutExerciseStatusChanged {
            user_id: UserId::new(1),
            workout_id: WorkoutId::new(2),
        });
        assert_eq!(pending.len(), 1);

        let drained = pending.drain();
        assert_eq!(drained.len(), 1);
        assert!(pending.is_empty());

        pending.raise(drained[0].clone());
        pending.clear();
        assert!(pending.is_empty());
    }
}
