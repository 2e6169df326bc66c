//! Integration tests for cycle progression, planning and deletion.

mod common;

use crate::common::{create_user, perform_all, seed_plan, seed_workout, TestHarness};
use chrono::{Duration, Utc};
use logbook_core::common::{CycleId, WorkoutError};
use logbook_core::domains::exercises;
use logbook_core::domains::workouts::{
    self, SetStatus, WorkoutCycle, WorkoutEvent, WorkoutInput, WorkoutSet,
};
use logbook_core::kernel::persistence::{CyclePath, PlanPath};
use test_context::test_context;

async fn cycle_of(ctx: &TestHarness, plan: PlanPath, id: CycleId) -> WorkoutCycle {
    let mut conn = ctx.db_pool.acquire().await.unwrap();
    WorkoutCycle::find(&plan.cycle(id), &mut conn).await.unwrap()
}

/// Completing the current cycle creates the next week and advances the plan.
#[test_context(TestHarness)]
#[tokio::test]
async fn completing_current_cycle_creates_successor(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool).await.unwrap();
    let seeded = seed_workout(&ctx.deps, user, 2).await.unwrap();
    perform_all(&ctx.deps, &seeded.sets, 60.0, 10).await.unwrap();

    let result = workouts::complete_workout_cycle(seeded.cycle, true, &ctx.deps)
        .await
        .unwrap();

    assert!(result.cycle.completed);
    let next = result.next_cycle.expect("successor cycle");
    assert_eq!(next.week_number, 2);
    assert_eq!(next.name, "Week #2");
    assert_eq!(next.previous_cycle_id, Some(seeded.cycle.cycle_id));
    assert_eq!(result.cycle.next_cycle_id, Some(next.id));
    assert_eq!(result.plan.current_cycle_id, Some(next.id));

    // Completing again does not create another week
    let again = workouts::complete_workout_cycle(seeded.cycle, true, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(again.next_cycle.map(|c| c.id), Some(next.id));
    let cycles = workouts::list_workout_cycles(user, seeded.plan.plan_id, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(cycles.len(), 2);
}

/// Un-completing keeps the successor in place.
#[test_context(TestHarness)]
#[tokio::test]
async fn uncompleting_cycle_keeps_successor(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool).await.unwrap();
    let cycle = seed_plan(&ctx.deps, user).await.unwrap();

    let completed = workouts::complete_workout_cycle(cycle, true, &ctx.deps)
        .await
        .unwrap();
    let next_id = completed.next_cycle.map(|c| c.id);

    let reopened = workouts::complete_workout_cycle(cycle, false, &ctx.deps)
        .await
        .unwrap();
    assert!(!reopened.cycle.completed);
    assert_eq!(reopened.cycle.next_cycle_id, next_id);
    assert_eq!(reopened.plan.current_cycle_id, next_id);
}

/// An empty follow-up week is planned from the previous one on first read.
#[test_context(TestHarness)]
#[tokio::test]
async fn next_cycle_cloned_from_previous(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool).await.unwrap();
    let seeded = seed_workout(&ctx.deps, user, 3).await.unwrap();
    perform_all(&ctx.deps, &seeded.sets, 62.5, 8).await.unwrap();
    // Never performed, so it has no date of its own
    let pull = workouts::create_workout(
        seeded.cycle,
        &WorkoutInput::builder().name("Pull").build(),
        &ctx.deps,
    )
    .await
    .unwrap();
    assert!(pull.date.is_none());

    let before = Utc::now();
    let progress = workouts::complete_workout_cycle(seeded.cycle, true, &ctx.deps)
        .await
        .unwrap();
    let next_path = seeded.plan.cycle(progress.next_cycle.unwrap().id);

    let week2 = workouts::get_workout_cycle(next_path, &ctx.deps).await.unwrap();
    let after = Utc::now();
    assert_eq!(week2.workouts.len(), 2);
    let clone = &week2.workouts[0];
    assert_eq!(clone.index, 1);
    assert_eq!(clone.name, "Push");
    assert!(!clone.completed && !clone.skipped);
    assert_eq!(clone.previous_workout_id, Some(seeded.workout.workout_id));
    assert!(clone.first_completed_at.is_none());
    assert!(!week2.cycle.completed);

    let pull_clone = &week2.workouts[1];
    assert_eq!(pull_clone.name, "Pull");
    assert_eq!(pull_clone.previous_workout_id, Some(pull.id));

    // Every clone is dated `index` days out, dated source or not
    for workout in &week2.workouts {
        let offset = Duration::days(i64::from(workout.index));
        let date = workout.date.expect("cloned workouts are dated");
        assert!(date >= before + offset - Duration::seconds(1) && date <= after + offset);
    }

    let details = workouts::get_workout(next_path.workout(clone.id), &ctx.deps)
        .await
        .unwrap();
    assert_eq!(details.exercises.len(), 1);
    let exercise = &details.exercises[0];
    assert_eq!(
        exercise.workout_exercise.previous_exercise_id,
        Some(seeded.exercise.workout_exercise_id)
    );
    assert!(!exercise.workout_exercise.completed);
    assert_eq!(exercise.sets.len(), 3);
    for set in &exercise.sets {
        assert!(!set.completed);
        assert_eq!(set.weight, None);
        assert_eq!(set.previous_weight, Some(62.5));
        assert_eq!(set.previous_reps, Some(8));
    }

    // A second read does not plan twice
    let again = workouts::get_workout_cycle(next_path, &ctx.deps).await.unwrap();
    assert_eq!(again.workouts.len(), 2);

    // The pre-set date does not hide the clone's first completion
    let clone_path = next_path.workout(clone.id).exercise(exercise.workout_exercise.id);
    let (last, rest) = exercise.sets.split_last().unwrap();
    for set in rest {
        workouts::complete_workout_set(clone_path.set(set.id), SetStatus::Completed, &ctx.deps)
            .await
            .unwrap();
    }
    let mut uow = ctx.deps.unit_of_work.begin().await.unwrap();
    let mut set = WorkoutSet::set_status(&clone_path.set(last.id), SetStatus::Completed, &mut uow)
        .await
        .unwrap();
    uow.dispatch(set.events.drain()).await.unwrap();
    let published = uow.commit().await.unwrap();
    let first = published.iter().find_map(|event| match event {
        WorkoutEvent::WorkoutCompleted { workout_id, first, .. } if *workout_id == clone.id => {
            Some(*first)
        }
        _ => None,
    });
    assert_eq!(first, Some(true));
}

/// Deleting the last week moves the plan back and reopens the previous week.
#[test_context(TestHarness)]
#[tokio::test]
async fn tail_deletion_reopens_previous(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool).await.unwrap();
    let seeded = seed_workout(&ctx.deps, user, 1).await.unwrap();
    perform_all(&ctx.deps, &seeded.sets, 60.0, 10).await.unwrap();

    let progress = workouts::complete_workout_cycle(seeded.cycle, true, &ctx.deps)
        .await
        .unwrap();
    let week2 = seeded.plan.cycle(progress.next_cycle.unwrap().id);

    workouts::delete_workout_cycle(week2, &ctx.deps).await.unwrap();

    let plan = workouts::get_workout_plan(user, seeded.plan.plan_id, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(plan.plan.current_cycle_id, Some(seeded.cycle.cycle_id));
    assert_eq!(plan.cycles.len(), 1);

    let week1 = cycle_of(ctx, seeded.plan, seeded.cycle.cycle_id).await;
    assert!(!week1.completed);
    assert_eq!(week1.next_cycle_id, None);
}

/// Deleting a middle week bridges its neighbours.
#[test_context(TestHarness)]
#[tokio::test]
async fn middle_deletion_bridges_neighbours(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool).await.unwrap();
    let week1 = seed_plan(&ctx.deps, user).await.unwrap();
    let plan = week1.plan();

    let week2_id = workouts::complete_workout_cycle(week1, true, &ctx.deps)
        .await
        .unwrap()
        .next_cycle
        .unwrap()
        .id;
    let week3_id = workouts::complete_workout_cycle(plan.cycle(week2_id), true, &ctx.deps)
        .await
        .unwrap()
        .next_cycle
        .unwrap()
        .id;

    workouts::delete_workout_cycle(plan.cycle(week2_id), &ctx.deps)
        .await
        .unwrap();

    let first = cycle_of(ctx, plan, week1.cycle_id).await;
    let third = cycle_of(ctx, plan, week3_id).await;
    assert_eq!(first.next_cycle_id, Some(week3_id));
    assert_eq!(third.previous_cycle_id, Some(week1.cycle_id));

    let details = workouts::get_workout_plan(user, plan.plan_id, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(details.plan.current_cycle_id, Some(week3_id));
    assert_eq!(details.cycles.len(), 2);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn first_cycle_cannot_be_deleted(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool).await.unwrap();
    let week1 = seed_plan(&ctx.deps, user).await.unwrap();

    let err = workouts::delete_workout_cycle(week1, &ctx.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkoutError::Precondition(_)));
    assert_eq!(err.status_code(), 409);
}

/// The carry-over pointer falls back when the week holding it is deleted.
#[test_context(TestHarness)]
#[tokio::test]
async fn cycle_deletion_rewinds_last_completed_pointer(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool).await.unwrap();
    let seeded = seed_workout(&ctx.deps, user, 1).await.unwrap();
    perform_all(&ctx.deps, &seeded.sets, 60.0, 10).await.unwrap();

    let week2: CyclePath = seeded.plan.cycle(
        workouts::complete_workout_cycle(seeded.cycle, true, &ctx.deps)
            .await
            .unwrap()
            .next_cycle
            .unwrap()
            .id,
    );
    let planned = workouts::get_workout_cycle(week2, &ctx.deps).await.unwrap();
    let workout = workouts::get_workout(week2.workout(planned.workouts[0].id), &ctx.deps)
        .await
        .unwrap();
    let exercise = &workout.exercises[0];
    let ie_id = exercise.individual_exercise.individual_exercise.id;
    let week2_sets: Vec<_> = exercise
        .sets
        .iter()
        .map(|s| {
            week2
                .workout(workout.workout.id)
                .exercise(exercise.workout_exercise.id)
                .set(s.id)
        })
        .collect();
    perform_all(&ctx.deps, &week2_sets, 65.0, 10).await.unwrap();

    let pointer = exercises::get_individual_exercise(user, ie_id, &ctx.deps)
        .await
        .unwrap()
        .individual_exercise
        .last_completed_workout_exercise_id;
    assert_eq!(pointer, Some(exercise.workout_exercise.id));

    workouts::delete_workout_cycle(week2, &ctx.deps).await.unwrap();

    let pointer = exercises::get_individual_exercise(user, ie_id, &ctx.deps)
        .await
        .unwrap()
        .individual_exercise
        .last_completed_workout_exercise_id;
    assert_eq!(pointer, Some(seeded.exercise.workout_exercise_id));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn rename_cycle(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool).await.unwrap();
    let week1 = seed_plan(&ctx.deps, user).await.unwrap();

    let renamed = workouts::update_workout_cycle(week1, "Deload", &ctx.deps)
        .await
        .unwrap();
    assert_eq!(renamed.name, "Deload");

    let mut forged = week1;
    forged.user_id = create_user(&ctx.db_pool).await.unwrap();
    let err = workouts::update_workout_cycle(forged, "Mine", &ctx.deps)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
