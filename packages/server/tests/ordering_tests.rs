//! Integration tests for index maintenance of workouts, exercises and sets.

mod common;

use crate::common::{
    create_muscle_group, create_user, exercise_input, seed_plan, seed_workout, TestHarness,
};
use logbook_core::common::WorkoutError;
use logbook_core::domains::workouts::{self, Direction, WorkoutInput, WorkoutSetInput};
use logbook_core::kernel::persistence::{CyclePath, WorkoutExercisePath};
use test_context::test_context;

async fn seed_workouts(ctx: &TestHarness, cycle: CyclePath, names: &[&str]) -> Vec<i32> {
    let inputs: Vec<_> = names
        .iter()
        .map(|name| WorkoutInput::builder().name(*name).build())
        .collect();
    workouts::create_multiple_workouts(cycle, &inputs, &ctx.deps)
        .await
        .unwrap()
        .iter()
        .map(|w| w.index)
        .collect()
}

async fn workout_names(ctx: &TestHarness, cycle: CyclePath) -> Vec<(i32, String)> {
    workouts::get_workout_cycle(cycle, &ctx.deps)
        .await
        .unwrap()
        .workouts
        .into_iter()
        .map(|w| (w.index, w.name))
        .collect()
}

async fn set_indexes(ctx: &TestHarness, exercise: WorkoutExercisePath) -> Vec<i32> {
    workouts::get_workout_exercise(exercise, &ctx.deps)
        .await
        .unwrap()
        .sets
        .iter()
        .map(|s| s.index)
        .collect()
}

fn named(pairs: &[(i32, &str)]) -> Vec<(i32, String)> {
    pairs.iter().map(|(i, n)| (*i, n.to_string())).collect()
}

#[test_context(TestHarness)]
#[tokio::test]
async fn batch_create_appends_in_order(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool).await.unwrap();
    let cycle = seed_plan(&ctx.deps, user).await.unwrap();

    let indexes = seed_workouts(ctx, cycle, &["Push", "Pull", "Legs"]).await;
    assert_eq!(indexes, vec![1, 2, 3]);

    let err = workouts::create_multiple_workouts(cycle, &[], &ctx.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkoutError::Validation(_)));
}

/// Inserting at an occupied index shifts the tail.
#[test_context(TestHarness)]
#[tokio::test]
async fn insert_in_middle_shifts_following(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool).await.unwrap();
    let cycle = seed_plan(&ctx.deps, user).await.unwrap();
    seed_workouts(ctx, cycle, &["Push", "Pull", "Legs"]).await;

    let inserted = workouts::create_workout(
        cycle,
        &WorkoutInput::builder().name("Core").index(Some(2)).build(),
        &ctx.deps,
    )
    .await
    .unwrap();
    assert_eq!(inserted.index, 2);

    assert_eq!(
        workout_names(ctx, cycle).await,
        named(&[(1, "Push"), (2, "Core"), (3, "Pull"), (4, "Legs")])
    );

    // Past the end appends
    let appended = workouts::create_workout(
        cycle,
        &WorkoutInput::builder().name("Cardio").index(Some(42)).build(),
        &ctx.deps,
    )
    .await
    .unwrap();
    assert_eq!(appended.index, 5);
}

/// Deleting closes the gap.
#[test_context(TestHarness)]
#[tokio::test]
async fn delete_keeps_indexes_contiguous(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool).await.unwrap();
    let cycle = seed_plan(&ctx.deps, user).await.unwrap();
    seed_workouts(ctx, cycle, &["Push", "Pull", "Legs"]).await;

    let pull = workouts::get_workout_cycle(cycle, &ctx.deps)
        .await
        .unwrap()
        .workouts[1]
        .id;
    workouts::delete_workout(cycle.workout(pull), &ctx.deps)
        .await
        .unwrap();

    assert_eq!(
        workout_names(ctx, cycle).await,
        named(&[(1, "Push"), (2, "Legs")])
    );
    let err = workouts::get_workout(cycle.workout(pull), &ctx.deps)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn move_up_then_down_restores_order(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool).await.unwrap();
    let cycle = seed_plan(&ctx.deps, user).await.unwrap();
    seed_workouts(ctx, cycle, &["Push", "Pull", "Legs"]).await;
    let before = workout_names(ctx, cycle).await;

    let legs = workouts::get_workout_cycle(cycle, &ctx.deps)
        .await
        .unwrap()
        .workouts[2]
        .id;
    let moved = workouts::move_workout(cycle.workout(legs), Direction::Up, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(moved.index, 2);
    assert_eq!(
        workout_names(ctx, cycle).await,
        named(&[(1, "Push"), (2, "Legs"), (3, "Pull")])
    );

    let moved = workouts::move_workout(cycle.workout(legs), Direction::Down, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(moved.index, 3);
    assert_eq!(workout_names(ctx, cycle).await, before);
}

/// Moves past either end fail and change nothing.
#[test_context(TestHarness)]
#[tokio::test]
async fn moves_out_of_range_are_rejected(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool).await.unwrap();
    let cycle = seed_plan(&ctx.deps, user).await.unwrap();
    seed_workouts(ctx, cycle, &["Push", "Pull"]).await;
    let listed = workouts::get_workout_cycle(cycle, &ctx.deps).await.unwrap();
    let (first, last) = (listed.workouts[0].id, listed.workouts[1].id);

    let err = workouts::move_workout(cycle.workout(last), Direction::Down, &ctx.deps)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = workouts::move_workout(cycle.workout(first), Direction::Up, &ctx.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkoutError::Validation(_)));

    assert_eq!(
        workout_names(ctx, cycle).await,
        named(&[(1, "Push"), (2, "Pull")])
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn exercises_reorder_within_workout(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool).await.unwrap();
    let seeded = seed_workout(&ctx.deps, user, 1).await.unwrap();

    let second = workouts::create_workout_exercise(
        seeded.workout,
        &exercise_input("Overhead Press", seeded.muscle_group_id, 2),
        &ctx.deps,
    )
    .await
    .unwrap();
    assert_eq!(second.workout_exercise.index, 2);

    let moved = workouts::move_workout_exercise(
        seeded.workout.exercise(second.workout_exercise.id),
        Direction::Up,
        &ctx.deps,
    )
    .await
    .unwrap();
    assert_eq!(moved.index, 1);

    let first = workouts::get_workout_exercise(seeded.exercise, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(first.workout_exercise.index, 2);
}

/// Creating then deleting a set leaves the exercise as it was.
#[test_context(TestHarness)]
#[tokio::test]
async fn set_create_then_delete_is_neutral(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool).await.unwrap();
    let seeded = seed_workout(&ctx.deps, user, 3).await.unwrap();
    let before = workouts::get_workout_exercise(seeded.exercise, &ctx.deps)
        .await
        .unwrap();

    let set = workouts::create_workout_set(
        seeded.exercise,
        &WorkoutSetInput::builder().index(Some(1)).build(),
        &ctx.deps,
    )
    .await
    .unwrap();
    assert_eq!(set.index, 1);
    assert_eq!(set_indexes(ctx, seeded.exercise).await, vec![1, 2, 3, 4]);

    workouts::delete_workout_set(seeded.exercise.set(set.id), &ctx.deps)
        .await
        .unwrap();

    let after = workouts::get_workout_exercise(seeded.exercise, &ctx.deps)
        .await
        .unwrap();
    let ids = |d: &workouts::WorkoutExerciseDetails| {
        d.sets.iter().map(|s| (s.id, s.index)).collect::<Vec<_>>()
    };
    assert_eq!(ids(&after), ids(&before));
    assert_eq!(
        after.workout_exercise.completed,
        before.workout_exercise.completed
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn set_moves_swap_neighbours(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool).await.unwrap();
    let seeded = seed_workout(&ctx.deps, user, 2).await.unwrap();

    let moved = workouts::move_workout_set(seeded.sets[0], Direction::Down, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(moved.index, 2);
    let other = workouts::get_workout_set(seeded.sets[1], &ctx.deps)
        .await
        .unwrap();
    assert_eq!(other.index, 1);

    let err = workouts::move_workout_set(seeded.sets[0], Direction::Down, &ctx.deps)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

/// Indexes are per parent.
#[test_context(TestHarness)]
#[tokio::test]
async fn sibling_workouts_number_independently(ctx: &TestHarness) {
    let user = create_user(&ctx.db_pool).await.unwrap();
    let cycle = seed_plan(&ctx.deps, user).await.unwrap();
    let muscle_group = create_muscle_group(&ctx.deps).await.unwrap();
    seed_workouts(ctx, cycle, &["Push", "Pull"]).await;
    let listed = workouts::get_workout_cycle(cycle, &ctx.deps).await.unwrap();

    for workout in &listed.workouts {
        let created = workouts::create_workout_exercise(
            cycle.workout(workout.id),
            &exercise_input("Row", muscle_group, 1),
            &ctx.deps,
        )
        .await
        .unwrap();
        assert_eq!(created.workout_exercise.index, 1);
    }
}
