use tracing::{debug, info};

use crate::common::{PlanId, Result, UserId, WorkoutError};
use crate::domains::exercises::IndividualExercise;
use crate::domains::workouts::data::{required_name, CycleCompletion, CycleWithWorkouts};
use crate::domains::workouts::models::{CompletionFlags, Workout, WorkoutCycle, WorkoutPlan};
use crate::kernel::persistence::{get_for_update, lock_ids_in_order, CyclePath, PlanPath, Table};
use crate::kernel::ServerDeps;

use super::carry_over::clone_previous_cycle;

/// Loads a cycle with its workouts.
///
/// An empty cycle that follows another one is first planned from it: the
/// previous week's workouts are cloned with their exercises and sets.
pub async fn get_workout_cycle(path: CyclePath, deps: &ServerDeps) -> Result<CycleWithWorkouts> {
    {
        let mut conn = deps.db_pool.acquire().await?;
        let cycle = WorkoutCycle::find(&path, &mut conn).await?;
        let workouts = Workout::find_by_cycle(cycle.id, &mut conn).await?;
        if !workouts.is_empty() || cycle.previous_cycle_id.is_none() {
            return Ok(CycleWithWorkouts { cycle, workouts });
        }
    }

    let mut uow = deps.unit_of_work.begin().await?;
    let mut cycle: WorkoutCycle = get_for_update(&mut uow, &path).await?;

    // Another request may have planned it while we waited for the lock
    let existing = Workout::find_by_cycle(cycle.id, &mut uow).await?;
    if existing.is_empty() {
        if let Some(previous_id) = cycle.previous_cycle_id {
            let previous = WorkoutCycle::find_by_id(previous_id, &mut uow).await?;
            if clone_previous_cycle(&mut uow, &previous, &cycle).await? > 0 {
                cycle.raise_status_changed(path.user_id);
                uow.dispatch(cycle.events.drain()).await?;
            }
        }
    } else {
        debug!(cycle_id = %cycle.id, "Cycle already planned");
    }

    let cycle = WorkoutCycle::find_by_id(cycle.id, &mut uow).await?;
    let workouts = Workout::find_by_cycle(cycle.id, &mut uow).await?;
    uow.commit().await?;

    Ok(CycleWithWorkouts { cycle, workouts })
}

pub async fn list_workout_cycles(
    user_id: UserId,
    plan_id: PlanId,
    deps: &ServerDeps,
) -> Result<Vec<WorkoutCycle>> {
    let path = PlanPath::new(user_id, plan_id);
    let mut conn = deps.db_pool.acquire().await?;

    WorkoutPlan::find(&path, &mut conn).await?;
    WorkoutCycle::find_by_plan(&path, &mut conn).await
}

pub async fn update_workout_cycle(
    path: CyclePath,
    name: &str,
    deps: &ServerDeps,
) -> Result<WorkoutCycle> {
    let name = required_name(name, "cycle name")?;
    let mut conn = deps.db_pool.acquire().await?;
    WorkoutCycle::rename(&path, name, &mut conn).await
}

/// Marks a cycle completed or pending.
///
/// Completing the plan's current cycle advances the plan to the next one,
/// creating it when it does not exist yet. Going back to pending leaves the
/// successor in place.
pub async fn complete_workout_cycle(
    path: CyclePath,
    completed: bool,
    deps: &ServerDeps,
) -> Result<CycleCompletion> {
    info!(
        user_id = %path.user_id,
        cycle_id = %path.cycle_id,
        completed,
        "Completing workout cycle"
    );

    let mut uow = deps.unit_of_work.begin().await?;
    let mut plan: WorkoutPlan = get_for_update(&mut uow, &path.plan()).await?;
    get_for_update::<_, WorkoutCycle>(&mut uow, &path).await?;

    let flags = if completed {
        CompletionFlags::of(true, false)
    } else {
        CompletionFlags::PENDING
    };
    let mut cycle = WorkoutCycle::set_flags(path.cycle_id, flags, &mut uow).await?;

    let advances = completed && plan.current_cycle_id == Some(cycle.id);
    let next_cycle = match cycle.next_cycle_id {
        Some(next_id) => {
            if advances {
                plan = WorkoutPlan::set_current_cycle(plan.id, Some(next_id), &mut uow).await?;
            }
            Some(WorkoutCycle::find_by_id(next_id, &mut uow).await?)
        }
        None if advances => {
            let successor =
                WorkoutCycle::insert(plan.id, cycle.week_number + 1, Some(cycle.id), &mut uow)
                    .await?;
            WorkoutCycle::set_next(cycle.id, Some(successor.id), &mut uow).await?;
            cycle.next_cycle_id = Some(successor.id);
            plan = WorkoutPlan::set_current_cycle(plan.id, Some(successor.id), &mut uow).await?;
            info!(
                plan_id = %plan.id,
                cycle_id = %successor.id,
                week_number = successor.week_number,
                "Next cycle created"
            );
            Some(successor)
        }
        None => None,
    };

    uow.commit().await?;
    Ok(CycleCompletion {
        cycle,
        next_cycle,
        plan,
    })
}

/// Deletes a cycle and relinks its neighbours.
///
/// The first cycle of a plan cannot be deleted. Individual exercises whose
/// last completed slot lives in the cycle fall back to that slot's own
/// carry-over source.
pub async fn delete_workout_cycle(path: CyclePath, deps: &ServerDeps) -> Result<()> {
    info!(user_id = %path.user_id, cycle_id = %path.cycle_id, "Deleting workout cycle");

    let mut uow = deps.unit_of_work.begin().await?;
    let plan: WorkoutPlan = get_for_update(&mut uow, &path.plan()).await?;
    let cycle: WorkoutCycle = get_for_update(&mut uow, &path).await?;

    let Some(previous_id) = cycle.previous_cycle_id else {
        return Err(WorkoutError::precondition(
            "the first cycle of a plan cannot be deleted",
        ));
    };

    let neighbours: Vec<i64> = std::iter::once(previous_id)
        .chain(cycle.next_cycle_id)
        .map(|id| id.value())
        .collect();
    lock_ids_in_order(&mut uow, Table::WorkoutCycles, &neighbours).await?;

    let rewound = IndividualExercise::rewind_for_cycle(cycle.id, &mut uow).await?;
    let is_current = plan.current_cycle_id == Some(cycle.id);

    match cycle.next_cycle_id {
        Some(next_id) => {
            WorkoutCycle::set_next(previous_id, Some(next_id), &mut uow).await?;
            WorkoutCycle::set_previous(next_id, Some(previous_id), &mut uow).await?;
            if is_current {
                WorkoutPlan::set_current_cycle(plan.id, Some(next_id), &mut uow).await?;
            }
        }
        None => {
            WorkoutCycle::set_next(previous_id, None, &mut uow).await?;
            WorkoutCycle::set_flags(previous_id, CompletionFlags::PENDING, &mut uow).await?;
            if is_current {
                WorkoutPlan::set_current_cycle(plan.id, Some(previous_id), &mut uow).await?;
            }
        }
    }

    WorkoutCycle::delete(cycle.id, &mut uow).await?;
    uow.commit().await?;

    debug!(cycle_id = %cycle.id, rewound, "Workout cycle deleted");
    Ok(())
}
