//! Database models for the activity log tables.
//!
//! Rows are read as-is; anything unparseable surfaces as a missing field so
//! the core validation can drop the record.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use diesel::prelude::*;
use log::debug;
use serde::{Deserialize, Serialize};

use studygoals_core::activities::{RawExamRecord, RawStudySession, RawTopicCompletion};
use studygoals_core::utils::time_utils::local_date_from_utc;

use crate::goals::DATE_FORMAT;

#[derive(Queryable, Insertable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::study_sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StudySessionDB {
    pub id: String,
    pub owner_id: String,
    pub session_date: Option<String>,
    pub minutes: Option<f64>,
    pub questions_attempted: Option<i64>,
    pub questions_correct: Option<i64>,
    pub subject: Option<String>,
}

#[derive(Queryable, Insertable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::exam_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ExamRecordDB {
    pub id: String,
    pub owner_id: String,
    pub exam_date: Option<String>,
    pub total_correct: Option<i64>,
    pub per_subject_correct: Option<String>,
}

#[derive(Queryable, Insertable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::topic_completions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TopicCompletionDB {
    pub id: String,
    pub owner_id: String,
    pub topic_id: Option<String>,
    pub completed_at: Option<String>,
    pub incidence: Option<String>,
    pub completed: Option<bool>,
}

/// Reads a plain calendar day, or a full timestamp bucketed into the local
/// day of `tz`.
fn parse_date(row_id: &str, value: Option<String>, tz: Tz) -> Option<NaiveDate> {
    let value = value?;
    let parsed = NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .ok()
        .or_else(|| {
            parse_timestamp(row_id, Some(value.clone())).map(|t| local_date_from_utc(t, tz))
        });
    if parsed.is_none() {
        debug!("Row {}: unparseable date '{}'", row_id, value);
    }
    parsed
}

fn parse_timestamp(row_id: &str, value: Option<String>) -> Option<DateTime<Utc>> {
    let value = value?;
    match DateTime::parse_from_rfc3339(value.trim()) {
        Ok(t) => Some(t.with_timezone(&Utc)),
        Err(e) => {
            debug!("Row {}: unparseable timestamp '{}': {}", row_id, value, e);
            None
        }
    }
}

impl StudySessionDB {
    pub fn into_raw(self, tz: Tz) -> RawStudySession {
        RawStudySession {
            session_date: parse_date(&self.id, self.session_date, tz),
            id: self.id,
            minutes: self.minutes,
            questions_attempted: self.questions_attempted,
            questions_correct: self.questions_correct,
            subject: self.subject,
        }
    }
}

impl ExamRecordDB {
    pub fn into_raw(self, tz: Tz) -> RawExamRecord {
        RawExamRecord {
            exam_date: parse_date(&self.id, self.exam_date, tz),
            id: self.id,
            total_correct: self.total_correct,
            per_subject_correct: self.per_subject_correct,
        }
    }
}

// Completion timestamps stay in UTC; the progress calculator buckets them.
impl From<TopicCompletionDB> for RawTopicCompletion {
    fn from(db: TopicCompletionDB) -> Self {
        Self {
            completed_at: parse_timestamp(&db.id, db.completed_at),
            id: db.id,
            topic_id: db.topic_id,
            incidence: db.incidence,
            completed: db.completed,
        }
    }
}
