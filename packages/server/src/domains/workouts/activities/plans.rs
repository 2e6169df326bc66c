use tracing::info;

use crate::common::{PlanId, Result, UserId, WorkoutError};
use crate::domains::workouts::data::{required_name, NewWorkoutPlan, PlanDetails, WorkoutPlanUpdate};
use crate::domains::workouts::models::{WorkoutCycle, WorkoutPlan};
use crate::kernel::persistence::{lock_for_update, PlanPath};
use crate::kernel::ServerDeps;

/// Creates a plan with its first cycle, "Week #1", as the current cycle.
///
/// Activating the new plan deactivates every other plan of the user.
pub async fn create_workout_plan(
    user_id: UserId,
    input: &NewWorkoutPlan,
    deps: &ServerDeps,
) -> Result<PlanDetails> {
    let name = required_name(&input.name, "plan name")?;
    info!(user_id = %user_id, name = %name, active = input.active, "Creating workout plan");

    let mut uow = deps.unit_of_work.begin().await?;
    if input.active {
        WorkoutPlan::lock_all_for_user(user_id, &mut uow).await?;
        WorkoutPlan::deactivate_others(user_id, None, &mut uow).await?;
    }

    let plan = WorkoutPlan::insert(user_id, name, input.active, &mut uow).await?;
    let cycle = WorkoutCycle::insert(plan.id, 1, None, &mut uow).await?;
    let plan = WorkoutPlan::set_current_cycle(plan.id, Some(cycle.id), &mut uow).await?;
    uow.commit().await?;

    Ok(PlanDetails {
        plan,
        cycles: vec![cycle],
    })
}

pub async fn get_workout_plan(
    user_id: UserId,
    plan_id: PlanId,
    deps: &ServerDeps,
) -> Result<PlanDetails> {
    let path = PlanPath::new(user_id, plan_id);
    let mut conn = deps.db_pool.acquire().await?;

    let plan = WorkoutPlan::find(&path, &mut conn).await?;
    let cycles = WorkoutCycle::find_by_plan(&path, &mut conn).await?;
    Ok(PlanDetails { plan, cycles })
}

pub async fn list_workout_plans(user_id: UserId, deps: &ServerDeps) -> Result<Vec<WorkoutPlan>> {
    let mut conn = deps.db_pool.acquire().await?;
    WorkoutPlan::find_by_user(user_id, &mut conn).await
}

pub async fn get_active_workout_plan(user_id: UserId, deps: &ServerDeps) -> Result<PlanDetails> {
    let mut conn = deps.db_pool.acquire().await?;
    let plan = WorkoutPlan::find_active(user_id, &mut conn)
        .await?
        .ok_or_else(|| WorkoutError::not_found("active workout plan"))?;
    let cycles = WorkoutCycle::find_by_plan(&PlanPath::new(user_id, plan.id), &mut conn).await?;
    Ok(PlanDetails { plan, cycles })
}

/// Renames and/or (de)activates a plan.
pub async fn update_workout_plan(
    user_id: UserId,
    plan_id: PlanId,
    input: &WorkoutPlanUpdate,
    deps: &ServerDeps,
) -> Result<WorkoutPlan> {
    let name = input
        .name
        .as_deref()
        .map(|name| required_name(name, "plan name"))
        .transpose()?;
    info!(user_id = %user_id, plan_id = %plan_id, active = ?input.active, "Updating workout plan");

    let path = PlanPath::new(user_id, plan_id);
    let mut uow = deps.unit_of_work.begin().await?;

    if input.active == Some(true) {
        let locked = WorkoutPlan::lock_all_for_user(user_id, &mut uow).await?;
        if !locked.contains(&plan_id) {
            return Err(WorkoutError::not_found("workout plan"));
        }
        WorkoutPlan::deactivate_others(user_id, Some(plan_id), &mut uow).await?;
    } else {
        lock_for_update(&mut uow, &path).await?;
    }

    let plan = WorkoutPlan::update(&path, name, input.active, &mut uow).await?;
    uow.commit().await?;
    Ok(plan)
}

/// Soft-deletes a plan. Its tree stays in place until the external cleanup.
pub async fn delete_workout_plan(user_id: UserId, plan_id: PlanId, deps: &ServerDeps) -> Result<()> {
    info!(user_id = %user_id, plan_id = %plan_id, "Deleting workout plan");

    let path = PlanPath::new(user_id, plan_id);
    let mut uow = deps.unit_of_work.begin().await?;
    lock_for_update(&mut uow, &path).await?;
    WorkoutPlan::soft_delete(&path, &mut uow).await?;
    uow.commit().await?;
    Ok(())
}
