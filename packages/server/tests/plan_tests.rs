//! Integration tests for workout plan use cases.

mod common;

use crate::common::{create_user, TestHarness};
use logbook_core::common::WorkoutError;
use logbook_core::domains::workouts::{
    self, NewWorkoutPlan, WorkoutPlan, WorkoutPlanUpdate,
};
use test_context::test_context;

fn plan(name: &str, active: bool) -> NewWorkoutPlan {
    NewWorkoutPlan::builder().name(name).active(active).build()
}

/// A new plan starts with week 1 as its current cycle.
#[test_context(TestHarness)]
#[tokio::test]
async fn create_plan_creates_first_cycle(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool).await.unwrap();

    let created = workouts::create_workout_plan(user, &plan("Strength", false), &ctx.deps)
        .await
        .unwrap();

    assert_eq!(created.cycles.len(), 1);
    let cycle = &created.cycles[0];
    assert_eq!(cycle.week_number, 1);
    assert_eq!(cycle.name, "Week #1");
    assert_eq!(cycle.previous_cycle_id, None);
    assert_eq!(created.plan.current_cycle_id, Some(cycle.id));

    let loaded = workouts::get_workout_plan(user, created.plan.id, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(loaded.cycles.len(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn create_plan_rejects_blank_name(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool).await.unwrap();

    let err = workouts::create_workout_plan(user, &plan("   ", false), &ctx.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkoutError::Validation(_)));
}

/// At most one plan per user is active.
#[test_context(TestHarness)]
#[tokio::test]
async fn activating_plan_deactivates_others(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool).await.unwrap();

    let first = workouts::create_workout_plan(user, &plan("A", true), &ctx.deps)
        .await
        .unwrap();
    let second = workouts::create_workout_plan(user, &plan("B", true), &ctx.deps)
        .await
        .unwrap();

    let active = workouts::get_active_workout_plan(user, &ctx.deps).await.unwrap();
    assert_eq!(active.plan.id, second.plan.id);

    let update = WorkoutPlanUpdate::builder().active(Some(true)).build();
    workouts::update_workout_plan(user, first.plan.id, &update, &ctx.deps)
        .await
        .unwrap();

    let plans = workouts::list_workout_plans(user, &ctx.deps).await.unwrap();
    let active: Vec<&WorkoutPlan> = plans.iter().filter(|p| p.active).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, first.plan.id);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn concurrent_activations_leave_one_active_plan(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool).await.unwrap();
    let mut ids = Vec::new();
    for name in ["A", "B", "C"] {
        let created = workouts::create_workout_plan(user, &plan(name, false), &ctx.deps)
            .await
            .unwrap();
        ids.push(created.plan.id);
    }

    let update = WorkoutPlanUpdate::builder().active(Some(true)).build();
    let (a, b, c) = tokio::join!(
        workouts::update_workout_plan(user, ids[0], &update, &ctx.deps),
        workouts::update_workout_plan(user, ids[1], &update, &ctx.deps),
        workouts::update_workout_plan(user, ids[2], &update, &ctx.deps),
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();

    let plans = workouts::list_workout_plans(user, &ctx.deps).await.unwrap();
    assert_eq!(plans.iter().filter(|p| p.active).count(), 1);
}

/// Another user's plan reads as missing.
#[test_context(TestHarness)]
#[tokio::test]
async fn foreign_plan_is_not_found(ctx: &TestHarness) {
    let owner = create_user(&ctx.db_pool).await.unwrap();
    let intruder = create_user(&ctx.db_pool).await.unwrap();
    let created = workouts::create_workout_plan(owner, &plan("Mine", false), &ctx.deps)
        .await
        .unwrap();

    let read = workouts::get_workout_plan(intruder, created.plan.id, &ctx.deps).await;
    assert!(read.unwrap_err().is_not_found());

    let update = WorkoutPlanUpdate::builder().name(Some("Stolen".to_string())).build();
    let write = workouts::update_workout_plan(intruder, created.plan.id, &update, &ctx.deps).await;
    assert!(write.unwrap_err().is_not_found());

    let delete = workouts::delete_workout_plan(intruder, created.plan.id, &ctx.deps).await;
    assert!(delete.unwrap_err().is_not_found());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn deleted_plan_disappears(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool).await.unwrap();
    let created = workouts::create_workout_plan(user, &plan("Old", true), &ctx.deps)
        .await
        .unwrap();

    workouts::delete_workout_plan(user, created.plan.id, &ctx.deps)
        .await
        .unwrap();

    let read = workouts::get_workout_plan(user, created.plan.id, &ctx.deps).await;
    assert!(read.unwrap_err().is_not_found());
    assert!(workouts::list_workout_plans(user, &ctx.deps).await.unwrap().is_empty());
    assert!(workouts::get_active_workout_plan(user, &ctx.deps)
        .await
        .unwrap_err()
        .is_not_found());
}
