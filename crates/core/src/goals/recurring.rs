//! Daily recurring goals: a template record plus one instance per day.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use uuid::Uuid;

use super::goals_model::{Goal, GoalStatus, SpawnedRecurringGoal};
use super::goals_traits::GoalRepositoryTrait;
use crate::errors::Result;

/// Creates templates and clones their daily instances.
pub struct RecurringInstanceManager {
    goal_repository: Arc<dyn GoalRepositoryTrait>,
    name_date_format: String,
}

impl RecurringInstanceManager {
    pub fn new(goal_repository: Arc<dyn GoalRepositoryTrait>, name_date_format: &str) -> Self {
        RecurringInstanceManager {
            goal_repository,
            name_date_format: name_date_format.to_string(),
        }
    }

    /// Display name of the instance tracking `date`.
    pub fn instance_name(&self, template_name: &str, date: NaiveDate) -> String {
        format!("{} ({})", template_name, date.format(&self.name_date_format))
    }

    /// Clones `template` into a fresh, Active, zero-progress instance for `date`.
    pub fn clone_instance(&self, template: &Goal, date: NaiveDate, now: DateTime<Utc>) -> Goal {
        Goal {
            id: Uuid::new_v4().to_string(),
            owner_id: template.owner_id.clone(),
            goal_type: template.goal_type,
            name: self.instance_name(&template.name, date),
            description: template.description.clone(),
            target_value: template.target_value,
            current_value: 0.0,
            unit: template.unit.clone(),
            recurring: false,
            parent_goal_id: Some(template.id.clone()),
            reference_date: Some(date),
            window_start: date,
            window_end: date,
            filter_subject: template.filter_subject.clone(),
            filter_incidence: template.filter_incidence,
            status: GoalStatus::Active,
            completed_at: None,
            created_by: template.created_by.clone(),
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    /// Persists `template` together with its first instance (for the window
    /// start day) in a single transaction.
    pub async fn spawn(&self, template: Goal, now: DateTime<Utc>) -> Result<SpawnedRecurringGoal> {
        let mut template = template;
        template.recurring = true;
        template.parent_goal_id = None;
        template.reference_date = None;
        template.current_value = 0.0;
        template.status = GoalStatus::Active;
        template.completed_at = None;

        let first_instance = self.clone_instance(&template, template.window_start, now);
        let mut stored = self
            .goal_repository
            .insert_goals(vec![template, first_instance])
            .await?
            .into_iter();

        match (stored.next(), stored.next()) {
            (Some(template), Some(first_instance)) => {
                info!(
                    "Created recurring goal {} with first instance {} for {}",
                    template.id,
                    first_instance.id,
                    first_instance
                        .reference_date
                        .map(|d| d.to_string())
                        .unwrap_or_default()
                );
                Ok(SpawnedRecurringGoal {
                    template,
                    first_instance,
                })
            }
            _ => Err(crate::Error::Unexpected(
                "repository returned fewer goals than inserted".to_string(),
            )),
        }
    }
}
