//! Goals domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::activities::Incidence;
use crate::goals::goals_errors::GoalError;

/// What a goal measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    Hours,
    Questions,
    MockExams,
    Topics,
    Streak,
    Performance,
}

impl GoalType {
    pub const ALL: [GoalType; 6] = [
        GoalType::Hours,
        GoalType::Questions,
        GoalType::MockExams,
        GoalType::Topics,
        GoalType::Streak,
        GoalType::Performance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::Hours => "hours",
            GoalType::Questions => "questions",
            GoalType::MockExams => "mock_exams",
            GoalType::Topics => "topics",
            GoalType::Streak => "streak",
            GoalType::Performance => "performance",
        }
    }
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GoalType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| s.to_string())
    }
}

/// Lifecycle state of a goal. Every state but `Active` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Completed,
    Expired,
    Cancelled,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
            GoalStatus::Expired => "expired",
            GoalStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, GoalStatus::Active)
    }

    /// Active moves to any terminal state; terminal states only go back via reopen.
    pub fn can_transition_to(&self, next: GoalStatus) -> bool {
        matches!(
            (self, next),
            (GoalStatus::Active, GoalStatus::Completed)
                | (GoalStatus::Active, GoalStatus::Expired)
                | (GoalStatus::Active, GoalStatus::Cancelled)
                | (GoalStatus::Completed, GoalStatus::Active)
                | (GoalStatus::Expired, GoalStatus::Active)
                | (GoalStatus::Cancelled, GoalStatus::Active)
        )
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(GoalStatus::Active),
            "completed" => Ok(GoalStatus::Completed),
            "expired" => Ok(GoalStatus::Expired),
            "cancelled" => Ok(GoalStatus::Cancelled),
            other => Err(other.to_string()),
        }
    }
}

/// The three shapes a goal record can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalKind {
    /// A plain goal with its own window.
    Standalone,
    /// The non-progressing parent of a daily recurring goal.
    Template,
    /// One day of a recurring goal.
    Instance,
}

/// Inclusive range of calendar days a goal aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateWindow { start, end }
    }

    pub fn single_day(day: NaiveDate) -> Self {
        DateWindow {
            start: day,
            end: day,
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }
}

/// Narrowing applied by Questions, Performance and Topics goals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalFilters {
    pub subject: Option<String>,
    pub incidence: Option<Incidence>,
}

/// Domain model representing a study goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub owner_id: String,
    pub goal_type: GoalType,
    pub name: String,
    pub description: Option<String>,
    pub target_value: f64,
    pub current_value: f64,
    pub unit: String,
    pub recurring: bool,
    pub parent_goal_id: Option<String>,
    pub reference_date: Option<NaiveDate>,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub filter_subject: Option<String>,
    pub filter_incidence: Option<Incidence>,
    pub status: GoalStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency token, bumped by every stored update.
    pub version: i32,
}

impl Goal {
    /// Shape of this record, or `None` if the fields are inconsistent
    /// (e.g. a parent id without a reference date).
    pub fn shape(&self) -> Option<GoalKind> {
        match (
            self.parent_goal_id.is_some(),
            self.reference_date.is_some(),
            self.recurring,
        ) {
            (false, false, false) => Some(GoalKind::Standalone),
            (false, false, true) => Some(GoalKind::Template),
            (true, true, _) => Some(GoalKind::Instance),
            _ => None,
        }
    }

    /// Like [`Goal::shape`], but reports an inconsistent record as an error.
    pub fn checked_shape(&self) -> Result<GoalKind, GoalError> {
        self.shape().ok_or_else(|| GoalError::InvalidShape {
            goal_id: self.id.clone(),
            reason: format!(
                "inconsistent shape (recurring={}, parent={:?}, referenceDate={:?})",
                self.recurring, self.parent_goal_id, self.reference_date
            ),
        })
    }

    /// Shape of a goal already checked on load; repositories reject records
    /// whose [`Goal::shape`] is `None`.
    pub fn kind(&self) -> GoalKind {
        self.shape().unwrap_or(GoalKind::Standalone)
    }

    pub fn is_template(&self) -> bool {
        self.kind() == GoalKind::Template
    }

    pub fn is_active(&self) -> bool {
        self.status == GoalStatus::Active
    }

    pub fn has_reached_target(&self) -> bool {
        self.current_value >= self.target_value
    }

    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.window_start, self.window_end)
    }

    pub fn filters(&self) -> GoalFilters {
        GoalFilters {
            subject: self.filter_subject.clone(),
            incidence: self.filter_incidence,
        }
    }
}

/// Input model for creating a new goal
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub id: Option<String>,
    /// Parsed into [`GoalType`] during validation.
    pub goal_type: String,
    pub name: String,
    pub description: Option<String>,
    pub target_value: f64,
    pub unit: Option<String>,
    #[serde(default)]
    pub recurring: bool,
    pub window_start: Option<NaiveDate>,
    pub window_end: Option<NaiveDate>,
    pub filter_subject: Option<String>,
    pub filter_incidence: Option<Incidence>,
    pub created_by: Option<String>,
}

/// Partial update of a goal. `None` leaves a field untouched; an empty
/// string clears `description` or `filter_subject`, and `Some(None)`
/// (`"filterIncidence": null` on the wire) clears `filter_incidence`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GoalUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_value: Option<f64>,
    pub unit: Option<String>,
    pub window_start: Option<NaiveDate>,
    pub window_end: Option<NaiveDate>,
    pub filter_subject: Option<String>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub filter_incidence: Option<Option<Incidence>>,
    /// When set, the update is rejected unless it matches the stored version.
    pub expected_version: Option<i32>,
}

// A present field, null included, deserializes to `Some`.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Outcome of a caller-supplied progress push.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub completed: bool,
    pub current_value: f64,
}

/// Outcome of an expiration sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepResult {
    pub expired_count: usize,
}

/// Outcome of materializing a day of a recurring goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolloverResult {
    pub instance: Goal,
    /// False when the instance for that day already existed.
    pub created: bool,
}

/// A freshly created recurring goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnedRecurringGoal {
    pub template: Goal,
    pub first_instance: Goal,
}
