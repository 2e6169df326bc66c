//! Post-commit recompute of the workout energy summary.
//!
//! Terminal handler for `WorkoutCompleted`, fenced by the handler log on the
//! event id so a re-delivered event does not run twice. A workout reopened
//! before the handler runs keeps its cleared summary.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::domains::workouts::energy::EnergyEstimator;
use crate::domains::workouts::events::WorkoutEvent;
use crate::domains::workouts::models::Workout;
use crate::domains::workouts::summary::recompute_summary;
use crate::kernel::{HandlerLog, Subscriber};

pub const WORKOUT_SUMMARY_HANDLER: &str = "workout.summary";

pub struct WorkoutSummarySubscriber {
    pool: PgPool,
    estimator: Arc<EnergyEstimator>,
}

impl WorkoutSummarySubscriber {
    pub fn new(pool: PgPool, estimator: Arc<EnergyEstimator>) -> Self {
        Self { pool, estimator }
    }
}

#[async_trait]
impl Subscriber<WorkoutEvent> for WorkoutSummarySubscriber {
    fn name(&self) -> &'static str {
        WORKOUT_SUMMARY_HANDLER
    }

    async fn handle(&self, event: &WorkoutEvent) -> anyhow::Result<()> {
        let WorkoutEvent::WorkoutCompleted {
            event_id,
            user_id,
            workout_id,
            ..
        } = event
        else {
            return Ok(());
        };
        let (user_id, workout_id) = (*user_id, *workout_id);
        let estimator = Arc::clone(&self.estimator);

        let processed = HandlerLog::try_process(
            WORKOUT_SUMMARY_HANDLER,
            WorkoutEvent::WORKOUT_COMPLETED,
            &event_id.to_string(),
            &self.pool,
            move |conn| {
                Box::pin(async move {
                    // Reopened since the event was raised
                    if !Workout::lock_completed(workout_id, &mut *conn).await? {
                        debug!(
                            workout_id = %workout_id,
                            "Workout no longer completed, summary left cleared"
                        );
                        return Ok(());
                    }
                    recompute_summary(user_id, workout_id, &estimator, conn).await?;
                    Ok(())
                })
            },
        )
        .await?;

        if processed {
            info!(%event_id, workout_id = %workout_id, "Workout summary refreshed");
        } else {
            debug!(%event_id, "Workout summary already refreshed for this event");
        }
        Ok(())
    }
}
