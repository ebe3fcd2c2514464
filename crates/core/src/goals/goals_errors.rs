use chrono::NaiveDate;
use thiserror::Error;

use super::goals_model::GoalStatus;

/// Errors specific to goal lookup and lifecycle handling.
#[derive(Error, Debug)]
pub enum GoalError {
    #[error("Goal not found: {0}")]
    NotFound(String),

    #[error("Goal {goal_id} does not belong to {owner_id}")]
    PermissionDenied { goal_id: String, owner_id: String },

    #[error("Invalid transition from {from} to {to} for goal {goal_id}")]
    InvalidTransition {
        goal_id: String,
        from: GoalStatus,
        to: GoalStatus,
    },

    #[error("Goal {goal_id} was modified concurrently (expected version {expected}, found {found})")]
    Conflict {
        goal_id: String,
        expected: i32,
        found: i32,
    },

    #[error("Goal {goal_id} has an invalid shape: {reason}")]
    InvalidShape { goal_id: String, reason: String },

    #[error("Goal {0} is not a recurring template")]
    NotATemplate(String),

    #[error("Date {date} is outside the window of goal {goal_id}")]
    OutsideWindow { goal_id: String, date: NaiveDate },
}
