use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info};
use uuid::Uuid;

use crate::activities::{load_activity_snapshot, ActivityLogReaderTrait};
use crate::errors::{DatabaseError, Error, Result, ValidationError};
use crate::goals::goals_cache::InMemoryGoalCache;
use crate::goals::goals_errors::GoalError;
use crate::goals::goals_model::{
    DateWindow, Goal, GoalFilters, GoalKind, GoalStatus, GoalType, GoalUpdate, NewGoal,
    ProgressUpdate, RolloverResult, SweepResult,
};
use crate::goals::goals_traits::{GoalCacheTrait, GoalRepositoryTrait, GoalServiceTrait};
use crate::goals::lifecycle::LifecycleSupervisor;
use crate::goals::progress_calculator::ProgressCalculator;
use crate::goals::recurring::RecurringInstanceManager;
use crate::settings::GoalEngineConfig;
use crate::utils::time_utils::{local_date_from_utc, Clock, SystemClock};

/// Orchestrates goal creation, edits, progress and lifecycle.
pub struct GoalService {
    goal_repository: Arc<dyn GoalRepositoryTrait>,
    activity_reader: Arc<dyn ActivityLogReaderTrait>,
    cache: Arc<dyn GoalCacheTrait>,
    clock: Arc<dyn Clock>,
    config: GoalEngineConfig,
    calculator: ProgressCalculator,
    lifecycle: LifecycleSupervisor,
    recurring: RecurringInstanceManager,
}

impl GoalService {
    /// Creates a service using the wall clock and an in-memory listing cache.
    pub fn new(
        goal_repository: Arc<dyn GoalRepositoryTrait>,
        activity_reader: Arc<dyn ActivityLogReaderTrait>,
        config: GoalEngineConfig,
    ) -> Self {
        let cache = Arc::new(InMemoryGoalCache::new(Duration::from_secs(
            config.list_cache_ttl_secs,
        )));
        Self::with_dependencies(
            goal_repository,
            activity_reader,
            cache,
            Arc::new(SystemClock),
            config,
        )
    }

    pub fn with_dependencies(
        goal_repository: Arc<dyn GoalRepositoryTrait>,
        activity_reader: Arc<dyn ActivityLogReaderTrait>,
        cache: Arc<dyn GoalCacheTrait>,
        clock: Arc<dyn Clock>,
        config: GoalEngineConfig,
    ) -> Self {
        GoalService {
            calculator: ProgressCalculator::new(config.timezone),
            lifecycle: LifecycleSupervisor::new(goal_repository.clone()),
            recurring: RecurringInstanceManager::new(
                goal_repository.clone(),
                &config.instance_name_date_format,
            ),
            goal_repository,
            activity_reader,
            cache,
            clock,
            config,
        }
    }

    fn now_and_today(&self) -> (DateTime<Utc>, NaiveDate) {
        let now = self.clock.now();
        (now, local_date_from_utc(now, self.config.timezone))
    }

    /// Loads a goal and checks it belongs to `owner_id`.
    fn get_owned_goal(&self, owner_id: &str, goal_id: &str) -> Result<Goal> {
        let goal = self
            .goal_repository
            .get_goal(goal_id)?
            .ok_or_else(|| GoalError::NotFound(goal_id.to_string()))?;
        if goal.owner_id != owner_id {
            return Err(GoalError::PermissionDenied {
                goal_id: goal_id.to_string(),
                owner_id: owner_id.to_string(),
            }
            .into());
        }
        goal.checked_shape()?;
        Ok(goal)
    }

    /// Computes a goal's value from the activity log.
    async fn compute_progress(
        &self,
        owner_id: &str,
        goal_type: GoalType,
        window: DateWindow,
        filters: &GoalFilters,
        today: NaiveDate,
    ) -> Result<f64> {
        let sources = ProgressCalculator::required_sources(goal_type);
        let snapshot =
            load_activity_snapshot(self.activity_reader.as_ref(), owner_id, sources).await?;
        let value = self
            .calculator
            .compute(goal_type, window, filters, &snapshot, today);
        debug!(
            "Computed {} progress for {} over {}..{}: {}",
            goal_type, owner_id, window.start, window.end, value
        );
        Ok(value)
    }

    /// Recomputes an Active, non-template goal in place. Returns whether it completed.
    async fn recompute(&self, goal: &mut Goal, now: DateTime<Utc>, today: NaiveDate) -> Result<bool> {
        if !goal.is_active() || goal.is_template() {
            return Ok(false);
        }
        let value = self
            .compute_progress(&goal.owner_id, goal.goal_type, goal.window(), &goal.filters(), today)
            .await?;
        Ok(LifecycleSupervisor::apply_progress(goal, value, now))
    }

    fn check_version(goal: &Goal, expected: Option<i32>) -> Result<()> {
        match expected {
            Some(expected) if expected != goal.version => Err(GoalError::Conflict {
                goal_id: goal.id.clone(),
                expected,
                found: goal.version,
            }
            .into()),
            _ => Ok(()),
        }
    }

    async fn store_update(&self, goal: Goal) -> Result<Goal> {
        let owner_id = goal.owner_id.clone();
        let stored = self.goal_repository.update_goal(goal).await?;
        self.cache.invalidate(&owner_id);
        Ok(stored)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn validate_target(target: f64) -> Result<()> {
    if !target.is_finite() || target <= 0.0 {
        return Err(ValidationError::NonPositiveTarget(target).into());
    }
    Ok(())
}

fn validate_window(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if !DateWindow::new(start, end).is_valid() {
        return Err(ValidationError::InvalidWindow {
            start: start.to_string(),
            end: end.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Checks a creation request and builds the Active goal record it describes.
fn build_goal(owner_id: &str, new_goal: NewGoal, now: DateTime<Utc>) -> Result<Goal> {
    let goal_type: GoalType = new_goal
        .goal_type
        .parse()
        .map_err(ValidationError::UnknownGoalType)?;
    let name = non_blank(Some(new_goal.name))
        .ok_or_else(|| ValidationError::MissingField("name".to_string()))?;
    validate_target(new_goal.target_value)?;
    let unit = non_blank(new_goal.unit)
        .ok_or_else(|| ValidationError::MissingField("unit".to_string()))?;
    let window_start = new_goal
        .window_start
        .ok_or_else(|| ValidationError::MissingField("windowStart".to_string()))?;
    let window_end = new_goal
        .window_end
        .ok_or_else(|| ValidationError::MissingField("windowEnd".to_string()))?;
    validate_window(window_start, window_end)?;
    if owner_id.trim().is_empty() {
        return Err(ValidationError::MissingField("ownerId".to_string()).into());
    }

    Ok(Goal {
        id: non_blank(new_goal.id).unwrap_or_else(|| Uuid::new_v4().to_string()),
        owner_id: owner_id.to_string(),
        goal_type,
        name,
        description: non_blank(new_goal.description),
        target_value: new_goal.target_value,
        current_value: 0.0,
        unit,
        recurring: new_goal.recurring,
        parent_goal_id: None,
        reference_date: None,
        window_start,
        window_end,
        filter_subject: non_blank(new_goal.filter_subject),
        filter_incidence: new_goal.filter_incidence,
        status: GoalStatus::Active,
        completed_at: None,
        created_by: non_blank(new_goal.created_by),
        created_at: now,
        updated_at: now,
        version: 1,
    })
}

#[async_trait]
impl GoalServiceTrait for GoalService {
    async fn create_goal(&self, owner_id: &str, new_goal: NewGoal) -> Result<Goal> {
        let (now, today) = self.now_and_today();
        let mut goal = build_goal(owner_id, new_goal, now)?;

        if goal.recurring {
            let spawned = self.recurring.spawn(goal, now).await?;
            self.cache.invalidate(owner_id);
            return Ok(spawned.template);
        }

        let completed = self.recompute(&mut goal, now, today).await?;
        let stored = self
            .goal_repository
            .insert_goals(vec![goal])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Unexpected("goal insert returned nothing".to_string()))?;
        self.cache.invalidate(owner_id);

        info!(
            "Created {} goal {} for {} ({} / {}{})",
            stored.goal_type,
            stored.id,
            owner_id,
            stored.current_value,
            stored.target_value,
            if completed { ", already completed" } else { "" }
        );
        Ok(stored)
    }

    async fn update_goal(
        &self,
        owner_id: &str,
        goal_id: &str,
        update: GoalUpdate,
    ) -> Result<Goal> {
        let (now, today) = self.now_and_today();
        let mut goal = self.get_owned_goal(owner_id, goal_id)?;
        Self::check_version(&goal, update.expected_version)?;

        if let Some(name) = update.name {
            goal.name = non_blank(Some(name))
                .ok_or_else(|| ValidationError::InvalidInput("name cannot be empty".to_string()))?;
        }
        if let Some(description) = update.description {
            goal.description = non_blank(Some(description));
        }
        if let Some(unit) = update.unit {
            goal.unit = non_blank(Some(unit))
                .ok_or_else(|| ValidationError::InvalidInput("unit cannot be empty".to_string()))?;
        }

        let target_changed = match update.target_value {
            Some(target) => {
                validate_target(target)?;
                let changed = target != goal.target_value;
                goal.target_value = target;
                changed
            }
            None => false,
        };

        let old_window = goal.window();
        let old_filters = goal.filters();
        let requested_window = DateWindow::new(
            update.window_start.unwrap_or(goal.window_start),
            update.window_end.unwrap_or(goal.window_end),
        );
        if goal.kind() == GoalKind::Instance && requested_window != old_window {
            return Err(GoalError::InvalidShape {
                goal_id: goal_id.to_string(),
                reason: "an instance's window is fixed to its reference date".to_string(),
            }
            .into());
        }
        if let Some(start) = update.window_start {
            goal.window_start = start;
        }
        if let Some(end) = update.window_end {
            goal.window_end = end;
        }
        validate_window(goal.window_start, goal.window_end)?;
        if let Some(subject) = update.filter_subject {
            goal.filter_subject = non_blank(Some(subject));
        }
        if let Some(incidence) = update.filter_incidence {
            goal.filter_incidence = incidence;
        }
        goal.updated_at = now;

        if goal.window() != old_window || goal.filters() != old_filters {
            self.recompute(&mut goal, now, today).await?;
        } else if target_changed && goal.is_active() {
            let current = goal.current_value;
            LifecycleSupervisor::apply_progress(&mut goal, current, now);
        }

        self.store_update(goal).await
    }

    async fn delete_goal(&self, owner_id: &str, goal_id: &str) -> Result<()> {
        let goal = self.get_owned_goal(owner_id, goal_id)?;
        let deleted = self.goal_repository.delete_goal(owner_id, &goal.id).await?;
        self.cache.invalidate(owner_id);
        if deleted == 0 {
            return Err(GoalError::NotFound(goal_id.to_string()).into());
        }
        info!("Deleted goal {} of {}", goal_id, owner_id);
        Ok(())
    }

    fn list_goals(&self, owner_id: &str) -> Result<Vec<Goal>> {
        if let Some(goals) = self.cache.get_goals(owner_id) {
            return Ok(goals);
        }
        let goals: Vec<Goal> = self
            .goal_repository
            .load_goals(owner_id)?
            .into_iter()
            .filter(|g| g.kind() != GoalKind::Template)
            .collect();
        self.cache.put_goals(owner_id, goals.clone());
        Ok(goals)
    }

    fn get_goal(&self, owner_id: &str, goal_id: &str) -> Result<Goal> {
        self.get_owned_goal(owner_id, goal_id)
    }

    fn list_instances(&self, owner_id: &str, template_id: &str) -> Result<Vec<Goal>> {
        let template = self.get_owned_goal(owner_id, template_id)?;
        if !template.is_template() {
            return Err(GoalError::NotATemplate(template_id.to_string()).into());
        }
        self.goal_repository.load_instances(template_id)
    }

    async fn update_goal_progress(
        &self,
        owner_id: &str,
        goal_id: &str,
        value: f64,
    ) -> Result<ProgressUpdate> {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::InvalidInput(format!(
                "progress must be a non-negative number (got {})",
                value
            ))
            .into());
        }

        let (now, _) = self.now_and_today();
        let mut goal = self.get_owned_goal(owner_id, goal_id)?;
        if goal.is_template() {
            return Err(GoalError::InvalidShape {
                goal_id: goal_id.to_string(),
                reason: "templates do not accrue progress".to_string(),
            }
            .into());
        }
        if goal.status.is_terminal() {
            debug!(
                "Ignoring progress push for {} goal {}",
                goal.status, goal_id
            );
            return Ok(ProgressUpdate {
                completed: false,
                current_value: goal.current_value,
            });
        }

        let completed = LifecycleSupervisor::apply_progress(&mut goal, value, now);
        let stored = self.store_update(goal).await?;
        if completed {
            info!("Goal {} of {} completed", goal_id, owner_id);
        }
        Ok(ProgressUpdate {
            completed,
            current_value: stored.current_value,
        })
    }

    async fn refresh_goal_progress(&self, owner_id: &str, goal_id: &str) -> Result<Goal> {
        let (now, today) = self.now_and_today();
        let mut goal = self.get_owned_goal(owner_id, goal_id)?;
        if !goal.is_active() || goal.is_template() {
            return Ok(goal);
        }
        self.recompute(&mut goal, now, today).await?;
        self.store_update(goal).await
    }

    async fn sweep_expired_goals(&self, owner_id: &str) -> Result<SweepResult> {
        let (now, today) = self.now_and_today();
        let expired_count = self.lifecycle.sweep(owner_id, today, now).await?;
        self.cache.invalidate(owner_id);
        Ok(SweepResult { expired_count })
    }

    async fn cancel_goal(&self, owner_id: &str, goal_id: &str) -> Result<Goal> {
        let (now, _) = self.now_and_today();
        let mut goal = self.get_owned_goal(owner_id, goal_id)?;
        LifecycleSupervisor::cancel(&mut goal, now)?;
        let stored = self.store_update(goal).await?;
        info!("Cancelled goal {} of {}", goal_id, owner_id);
        Ok(stored)
    }

    async fn reopen_goal(&self, owner_id: &str, goal_id: &str) -> Result<Goal> {
        let (now, today) = self.now_and_today();
        let mut goal = self.get_owned_goal(owner_id, goal_id)?;
        LifecycleSupervisor::reopen(&mut goal, now)?;
        self.recompute(&mut goal, now, today).await?;
        let stored = self.store_update(goal).await?;
        info!("Reopened goal {} of {} as {}", goal_id, owner_id, stored.status);
        Ok(stored)
    }

    async fn rollover_instances(
        &self,
        owner_id: &str,
        template_id: &str,
        date: NaiveDate,
    ) -> Result<RolloverResult> {
        let (now, today) = self.now_and_today();
        let template = self.get_owned_goal(owner_id, template_id)?;
        if !template.is_template() {
            return Err(GoalError::NotATemplate(template_id.to_string()).into());
        }
        if !template.is_active() {
            return Err(GoalError::InvalidTransition {
                goal_id: template_id.to_string(),
                from: template.status,
                to: GoalStatus::Active,
            }
            .into());
        }
        if !template.window().contains(date) {
            return Err(GoalError::OutsideWindow {
                goal_id: template_id.to_string(),
                date,
            }
            .into());
        }

        if let Some(existing) = self.goal_repository.find_instance(template_id, date)? {
            return Ok(RolloverResult {
                instance: existing,
                created: false,
            });
        }

        let mut instance = self.recurring.clone_instance(&template, date, now);
        self.recompute(&mut instance, now, today).await?;

        match self.goal_repository.insert_goals(vec![instance]).await {
            Ok(stored) => {
                self.cache.invalidate(owner_id);
                let instance = stored.into_iter().next().ok_or_else(|| {
                    Error::Unexpected("instance insert returned nothing".to_string())
                })?;
                info!(
                    "Rolled over template {} to {} (instance {})",
                    template_id, date, instance.id
                );
                Ok(RolloverResult {
                    instance,
                    created: true,
                })
            }
            // Another caller created the same day first.
            Err(Error::Database(DatabaseError::UniqueViolation(_))) => {
                let existing = self
                    .goal_repository
                    .find_instance(template_id, date)?
                    .ok_or_else(|| GoalError::NotFound(format!("{}@{}", template_id, date)))?;
                Ok(RolloverResult {
                    instance: existing,
                    created: false,
                })
            }
            Err(e) => Err(e),
        }
    }
}
