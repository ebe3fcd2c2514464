//! Database models for goals.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use studygoals_core::errors::{Error, ValidationError};
use studygoals_core::goals::Goal;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database model for goals. Dates are stored as `YYYY-MM-DD` text and
/// timestamps as RFC 3339 text, so string comparison orders them correctly.
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::goals)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
#[serde(rename_all = "camelCase")]
pub struct GoalDB {
    pub id: String,
    pub owner_id: String,
    pub goal_type: String,
    pub name: String,
    pub description: Option<String>,
    pub target_value: f64,
    pub current_value: f64,
    pub unit: String,
    pub recurring: bool,
    pub parent_goal_id: Option<String>,
    pub reference_date: Option<String>,
    pub window_start: String,
    pub window_end: String,
    pub filter_subject: Option<String>,
    pub filter_incidence: Option<String>,
    pub status: String,
    pub completed_at: Option<String>,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub version: i32,
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        ValidationError::InvalidInput(format!("invalid {} '{}': {}", field, value, e)).into()
    })
}

fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            ValidationError::InvalidInput(format!("invalid {} '{}': {}", field, value, e)).into()
        })
}

fn parse_enum<T: std::str::FromStr<Err = String>>(field: &str, value: &str) -> Result<T, Error> {
    value.parse::<T>().map_err(|e| {
        ValidationError::InvalidInput(format!("invalid {} '{}': {}", field, value, e)).into()
    })
}

impl From<Goal> for GoalDB {
    fn from(goal: Goal) -> Self {
        Self {
            id: goal.id,
            owner_id: goal.owner_id,
            goal_type: goal.goal_type.as_str().to_string(),
            name: goal.name,
            description: goal.description,
            target_value: goal.target_value,
            current_value: goal.current_value,
            unit: goal.unit,
            recurring: goal.recurring,
            parent_goal_id: goal.parent_goal_id,
            reference_date: goal.reference_date.map(format_date),
            window_start: format_date(goal.window_start),
            window_end: format_date(goal.window_end),
            filter_subject: goal.filter_subject,
            filter_incidence: goal.filter_incidence.map(|i| i.as_str().to_string()),
            status: goal.status.as_str().to_string(),
            completed_at: goal.completed_at.map(|t| t.to_rfc3339()),
            created_by: goal.created_by,
            created_at: goal.created_at.to_rfc3339(),
            updated_at: goal.updated_at.to_rfc3339(),
            version: goal.version,
        }
    }
}

impl TryFrom<GoalDB> for Goal {
    type Error = Error;

    fn try_from(db: GoalDB) -> Result<Self, Self::Error> {
        let goal = Self {
            goal_type: parse_enum("goal_type", &db.goal_type)?,
            reference_date: db
                .reference_date
                .as_deref()
                .map(|d| parse_date("reference_date", d))
                .transpose()?,
            window_start: parse_date("window_start", &db.window_start)?,
            window_end: parse_date("window_end", &db.window_end)?,
            filter_incidence: db
                .filter_incidence
                .as_deref()
                .map(|i| parse_enum("filter_incidence", i))
                .transpose()?,
            status: parse_enum("status", &db.status)?,
            completed_at: db
                .completed_at
                .as_deref()
                .map(|t| parse_timestamp("completed_at", t))
                .transpose()?,
            created_at: parse_timestamp("created_at", &db.created_at)?,
            updated_at: parse_timestamp("updated_at", &db.updated_at)?,
            id: db.id,
            owner_id: db.owner_id,
            name: db.name,
            description: db.description,
            target_value: db.target_value,
            current_value: db.current_value,
            unit: db.unit,
            recurring: db.recurring,
            parent_goal_id: db.parent_goal_id,
            filter_subject: db.filter_subject,
            created_by: db.created_by,
            version: db.version,
        };
        goal.checked_shape()?;
        Ok(goal)
    }
}
