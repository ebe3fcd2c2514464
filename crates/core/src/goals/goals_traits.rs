use crate::errors::Result;
use crate::goals::goals_model::{
    Goal, GoalUpdate, NewGoal, ProgressUpdate, RolloverResult, SweepResult,
};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Trait for goal repository operations
#[async_trait]
pub trait GoalRepositoryTrait: Send + Sync {
    fn get_goal(&self, goal_id: &str) -> Result<Option<Goal>>;

    /// Every goal of the owner, templates included.
    fn load_goals(&self, owner_id: &str) -> Result<Vec<Goal>>;

    fn load_instances(&self, template_id: &str) -> Result<Vec<Goal>>;

    fn find_instance(&self, template_id: &str, reference_date: NaiveDate) -> Result<Option<Goal>>;

    /// Active goals of the owner whose window ended strictly before `before`.
    fn find_active_expiring(&self, owner_id: &str, before: NaiveDate) -> Result<Vec<Goal>>;

    /// Inserts all goals in one transaction.
    async fn insert_goals(&self, goals: Vec<Goal>) -> Result<Vec<Goal>>;

    /// Stores `goal` if its `version` still matches the stored one and
    /// returns the stored record with the bumped version.
    async fn update_goal(&self, goal: Goal) -> Result<Goal>;

    /// Version-checked update of many goals in one transaction.
    async fn update_goals(&self, goals: Vec<Goal>) -> Result<usize>;

    async fn delete_goal(&self, owner_id: &str, goal_id: &str) -> Result<usize>;
}

/// Per-owner cache of goal listings, injected into the goal service.
pub trait GoalCacheTrait: Send + Sync {
    fn get_goals(&self, owner_id: &str) -> Option<Vec<Goal>>;
    fn put_goals(&self, owner_id: &str, goals: Vec<Goal>);
    fn invalidate(&self, owner_id: &str);
}

/// Trait for goal service operations
#[async_trait]
pub trait GoalServiceTrait: Send + Sync {
    async fn create_goal(&self, owner_id: &str, new_goal: NewGoal) -> Result<Goal>;

    async fn update_goal(&self, owner_id: &str, goal_id: &str, update: GoalUpdate)
        -> Result<Goal>;

    async fn delete_goal(&self, owner_id: &str, goal_id: &str) -> Result<()>;

    /// Standalone goals and instances; templates are left out.
    fn list_goals(&self, owner_id: &str) -> Result<Vec<Goal>>;

    fn get_goal(&self, owner_id: &str, goal_id: &str) -> Result<Goal>;

    fn list_instances(&self, owner_id: &str, template_id: &str) -> Result<Vec<Goal>>;

    async fn update_goal_progress(
        &self,
        owner_id: &str,
        goal_id: &str,
        value: f64,
    ) -> Result<ProgressUpdate>;

    async fn refresh_goal_progress(&self, owner_id: &str, goal_id: &str) -> Result<Goal>;

    async fn sweep_expired_goals(&self, owner_id: &str) -> Result<SweepResult>;

    async fn cancel_goal(&self, owner_id: &str, goal_id: &str) -> Result<Goal>;

    async fn reopen_goal(&self, owner_id: &str, goal_id: &str) -> Result<Goal>;

    async fn rollover_instances(
        &self,
        owner_id: &str,
        template_id: &str,
        date: NaiveDate,
    ) -> Result<RolloverResult>;
}
