//! Goal lifecycle: Active → {Completed, Expired, Cancelled}.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info};

use super::goals_errors::GoalError;
use super::goals_model::{Goal, GoalStatus};
use super::goals_traits::GoalRepositoryTrait;
use crate::errors::Result;

/// Decides and executes status transitions.
pub struct LifecycleSupervisor {
    goal_repository: Arc<dyn GoalRepositoryTrait>,
}

impl LifecycleSupervisor {
    pub fn new(goal_repository: Arc<dyn GoalRepositoryTrait>) -> Self {
        LifecycleSupervisor { goal_repository }
    }

    fn transition(goal: &mut Goal, next: GoalStatus, now: DateTime<Utc>) -> Result<()> {
        if !goal.status.can_transition_to(next) {
            return Err(GoalError::InvalidTransition {
                goal_id: goal.id.clone(),
                from: goal.status,
                to: next,
            }
            .into());
        }
        goal.status = next;
        goal.updated_at = now;
        Ok(())
    }

    /// Records `value` as the goal's progress and completes it if the target
    /// is met. Returns true when this call completed the goal.
    ///
    /// Templates never progress; terminal goals keep their status.
    pub fn apply_progress(goal: &mut Goal, value: f64, now: DateTime<Utc>) -> bool {
        if goal.is_template() {
            goal.current_value = 0.0;
            return false;
        }
        goal.current_value = value;
        goal.updated_at = now;
        if goal.is_active() && goal.has_reached_target() {
            goal.status = GoalStatus::Completed;
            goal.completed_at = Some(now);
            return true;
        }
        false
    }

    /// An Active goal whose last day is before `today` and whose target was not met.
    pub fn is_expired(goal: &Goal, today: NaiveDate) -> bool {
        goal.is_active() && goal.window_end < today && !goal.has_reached_target()
    }

    pub fn expire(goal: &mut Goal, now: DateTime<Utc>) -> Result<()> {
        Self::transition(goal, GoalStatus::Expired, now)
    }

    pub fn cancel(goal: &mut Goal, now: DateTime<Utc>) -> Result<()> {
        Self::transition(goal, GoalStatus::Cancelled, now)
    }

    /// Moves a terminal goal back to Active. Progress is left to the caller.
    pub fn reopen(goal: &mut Goal, now: DateTime<Utc>) -> Result<()> {
        Self::transition(goal, GoalStatus::Active, now)?;
        goal.completed_at = None;
        Ok(())
    }

    /// Expires every Active goal of the owner whose window ended before `today`.
    ///
    /// All transitions are committed as one batch; if the batch fails no goal
    /// changes. A goal that already meets its target is completed instead of
    /// expired and is not counted.
    pub async fn sweep(
        &self,
        owner_id: &str,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let candidates = self.goal_repository.find_active_expiring(owner_id, today)?;
        if candidates.is_empty() {
            debug!("Sweep for {}: nothing to expire", owner_id);
            return Ok(0);
        }

        let mut expired = 0;
        let mut batch = Vec::with_capacity(candidates.len());
        for mut goal in candidates {
            if Self::is_expired(&goal, today) {
                Self::expire(&mut goal, now)?;
                expired += 1;
            } else if goal.is_active() && goal.has_reached_target() && goal.window_end < today {
                Self::transition(&mut goal, GoalStatus::Completed, now)?;
                goal.completed_at = Some(now);
            } else {
                continue;
            }
            batch.push(goal);
        }

        if batch.is_empty() {
            return Ok(0);
        }
        self.goal_repository.update_goals(batch).await?;
        info!("Sweep for {}: expired {} goal(s)", owner_id, expired);
        Ok(expired)
    }
}
