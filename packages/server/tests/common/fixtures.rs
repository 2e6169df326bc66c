//! Test fixtures.
//!
//! Users are inserted with SQL (the core never writes them); everything else
//! goes through the activities so fixtures exercise the same paths as callers.

use anyhow::Result;
use logbook_core::common::{MuscleGroupId, UserId};
use logbook_core::domains::exercises::{self, IndividualExerciseInput};
use logbook_core::domains::workouts::{
    self, ExerciseChoice, NewWorkoutPlan, SetStatus, WorkoutExerciseInput, WorkoutInput,
};
use logbook_core::kernel::persistence::{
    CyclePath, PlanPath, WorkoutExercisePath, WorkoutPath, WorkoutSetPath,
};
use logbook_core::kernel::ServerDeps;
use sqlx::PgPool;
use uuid::Uuid;

/// Insert a user without profile data.
pub async fn create_user(pool: &PgPool) -> Result<UserId> {
    create_user_with_profile(pool, None, None).await
}

pub async fn create_user_with_profile(
    pool: &PgPool,
    weight_kg: Option<f64>,
    sex: Option<&str>,
) -> Result<UserId> {
    let id = sqlx::query_scalar::<_, UserId>(
        "INSERT INTO users (email, weight_kg, sex) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(format!("{}@test.local", Uuid::new_v4()))
    .bind(weight_kg)
    .bind(sex)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Catalog names are global, so every fixture name gets a unique suffix.
pub fn unique(name: &str) -> String {
    format!("{name} {}", Uuid::new_v4().simple())
}

pub async fn create_muscle_group(deps: &ServerDeps) -> Result<MuscleGroupId> {
    let group = exercises::create_muscle_group(&unique("Chest"), deps).await?;
    Ok(group.id)
}

/// Input for a slot using a new individual exercise named `name`.
pub fn exercise_input(name: &str, muscle_group_id: MuscleGroupId, sets_qt: i32) -> WorkoutExerciseInput {
    WorkoutExerciseInput::builder()
        .exercise(ExerciseChoice::Lookup(
            IndividualExerciseInput::builder()
                .name(Some(name.to_string()))
                .muscle_group_id(Some(muscle_group_id))
                .build(),
        ))
        .sets_qt(sets_qt)
        .build()
}

/// A plan with one workout holding one exercise slot.
pub struct SeededWorkout {
    pub user_id: UserId,
    pub muscle_group_id: MuscleGroupId,
    pub plan: PlanPath,
    pub cycle: CyclePath,
    pub workout: WorkoutPath,
    pub exercise: WorkoutExercisePath,
    pub sets: Vec<WorkoutSetPath>,
}

pub async fn seed_plan(deps: &ServerDeps, user_id: UserId) -> Result<CyclePath> {
    let plan = workouts::create_workout_plan(
        user_id,
        &NewWorkoutPlan::builder().name("Strength").active(true).build(),
        deps,
    )
    .await?;
    let cycle = plan.cycles[0].id;
    Ok(PlanPath::new(user_id, plan.plan.id).cycle(cycle))
}

pub async fn seed_workout(deps: &ServerDeps, user_id: UserId, sets_qt: i32) -> Result<SeededWorkout> {
    let cycle = seed_plan(deps, user_id).await?;
    let muscle_group_id = create_muscle_group(deps).await?;

    let workout = workouts::create_workout(
        cycle,
        &WorkoutInput::builder().name("Push").build(),
        deps,
    )
    .await?;
    let workout = cycle.workout(workout.id);

    let exercise = workouts::create_workout_exercise(
        workout,
        &exercise_input("Bench Press", muscle_group_id, sets_qt),
        deps,
    )
    .await?;
    let sets = exercise
        .sets
        .iter()
        .map(|set| workout.exercise(exercise.workout_exercise.id).set(set.id))
        .collect();

    Ok(SeededWorkout {
        user_id,
        muscle_group_id,
        plan: cycle.plan(),
        cycle,
        workout,
        exercise: workout.exercise(exercise.workout_exercise.id),
        sets,
    })
}

/// Log weight and reps on every set, then complete them.
pub async fn perform_all(deps: &ServerDeps, sets: &[WorkoutSetPath], weight: f64, reps: i32) -> Result<()> {
    for set in sets {
        workouts::update_workout_set(
            *set,
            &workouts::WorkoutSetUpdate::builder()
                .weight(Some(weight))
                .reps(Some(reps))
                .build(),
            deps,
        )
        .await?;
        workouts::complete_workout_set(*set, SetStatus::Completed, deps).await?;
    }
    Ok(())
}
