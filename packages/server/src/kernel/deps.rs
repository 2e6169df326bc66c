//! Server dependencies shared by every use case.

use std::sync::Arc;

use sqlx::PgPool;

use super::unit_of_work::{UnitOfWorkFactory, WorkoutBus, WorkoutDispatcher};
use crate::domains::workouts::effects::register_workout_effects;
use crate::domains::workouts::energy::EnergyEstimator;

/// Server dependencies accessible to activities and effects.
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub unit_of_work: UnitOfWorkFactory,
    pub estimator: Arc<EnergyEstimator>,
}

impl ServerDeps {
    /// Builds the dispatcher and bus registries and wires the workout effects.
    ///
    /// Registries are written here once and only read afterwards.
    pub async fn new(db_pool: PgPool, estimator: EnergyEstimator) -> Self {
        let estimator = Arc::new(estimator);
        let dispatcher = Arc::new(WorkoutDispatcher::new());
        let bus = WorkoutBus::new();

        register_workout_effects(&dispatcher, &bus, db_pool.clone(), Arc::clone(&estimator)).await;

        Self {
            unit_of_work: UnitOfWorkFactory::new(db_pool.clone(), dispatcher, bus),
            db_pool,
            estimator,
        }
    }
}

impl std::fmt::Debug for ServerDeps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerDeps")
            .field("estimator", &self.estimator)
            .finish_non_exhaustive()
    }
}
