//! Activity log models: raw rows as stored, and the validated DTOs built from them.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::activities_errors::ActivityError;

/// The three independent activity sources of the log store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivitySource {
    StudySessions,
    ExamRecords,
    TopicCompletions,
}

impl fmt::Display for ActivitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivitySource::StudySessions => write!(f, "study session"),
            ActivitySource::ExamRecords => write!(f, "exam record"),
            ActivitySource::TopicCompletions => write!(f, "topic completion"),
        }
    }
}

/// How often a curriculum topic shows up in exams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Incidence {
    #[serde(rename = "alta")]
    High,
    #[serde(rename = "media")]
    Medium,
    #[serde(rename = "baixa")]
    Low,
}

impl Incidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Incidence::High => "alta",
            Incidence::Medium => "media",
            Incidence::Low => "baixa",
        }
    }
}

impl fmt::Display for Incidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Incidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alta" | "high" => Ok(Incidence::High),
            "media" | "média" | "medium" => Ok(Incidence::Medium),
            "baixa" | "low" => Ok(Incidence::Low),
            other => Err(format!("unknown incidence '{}'", other)),
        }
    }
}

// =============================================================================
// Raw rows
// =============================================================================

/// A study session row as stored. Every payload field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStudySession {
    pub id: String,
    pub session_date: Option<NaiveDate>,
    pub minutes: Option<f64>,
    pub questions_attempted: Option<i64>,
    pub questions_correct: Option<i64>,
    pub subject: Option<String>,
}

/// A mock-exam result row as stored. `per_subject_correct` is a JSON object text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExamRecord {
    pub id: String,
    pub exam_date: Option<NaiveDate>,
    pub total_correct: Option<i64>,
    pub per_subject_correct: Option<String>,
}

/// A topic-completion event row as stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTopicCompletion {
    pub id: String,
    pub topic_id: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub incidence: Option<String>,
    pub completed: Option<bool>,
}

// =============================================================================
// Validated DTOs
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub date: NaiveDate,
    pub minutes: f64,
    pub questions_attempted: u32,
    pub questions_correct: u32,
    pub subject: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamRecord {
    pub date: NaiveDate,
    pub total_correct: u32,
    pub per_subject_correct: HashMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicCompletion {
    pub topic_id: String,
    pub completed_at: DateTime<Utc>,
    pub incidence: Option<Incidence>,
    pub completed: bool,
}

/// Missing counts default to zero; negative or oversized counts are rejected.
fn count_field(
    source_kind: ActivitySource,
    record_id: &str,
    field: &str,
    value: Option<i64>,
) -> Result<u32, ActivityError> {
    match value {
        None => Ok(0),
        Some(v) => u32::try_from(v).map_err(|_| {
            ActivityError::invalid(
                source_kind,
                record_id,
                format!("{} out of range: {}", field, v),
            )
        }),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl TryFrom<RawStudySession> for StudySession {
    type Error = ActivityError;

    fn try_from(raw: RawStudySession) -> Result<Self, Self::Error> {
        let kind = ActivitySource::StudySessions;
        let date = raw
            .session_date
            .ok_or_else(|| ActivityError::invalid(kind, &raw.id, "missing session date"))?;

        let minutes = raw.minutes.unwrap_or(0.0);
        if !minutes.is_finite() || minutes < 0.0 {
            return Err(ActivityError::invalid(
                kind,
                &raw.id,
                format!("invalid minutes: {}", minutes),
            ));
        }

        Ok(StudySession {
            date,
            minutes,
            questions_attempted: count_field(
                kind,
                &raw.id,
                "questionsAttempted",
                raw.questions_attempted,
            )?,
            questions_correct: count_field(kind, &raw.id, "questionsCorrect", raw.questions_correct)?,
            subject: non_blank(raw.subject),
        })
    }
}

impl TryFrom<RawExamRecord> for ExamRecord {
    type Error = ActivityError;

    fn try_from(raw: RawExamRecord) -> Result<Self, Self::Error> {
        let kind = ActivitySource::ExamRecords;
        let date = raw
            .exam_date
            .ok_or_else(|| ActivityError::invalid(kind, &raw.id, "missing exam date"))?;

        let per_subject_raw: HashMap<String, i64> = match raw.per_subject_correct.as_deref() {
            None => HashMap::new(),
            Some(text) if text.trim().is_empty() => HashMap::new(),
            Some(text) => serde_json::from_str(text).map_err(|e| {
                ActivityError::invalid(kind, &raw.id, format!("malformed perSubjectCorrect: {}", e))
            })?,
        };

        let mut per_subject_correct = HashMap::with_capacity(per_subject_raw.len());
        for (subject, count) in per_subject_raw {
            let count = count_field(kind, &raw.id, "perSubjectCorrect", Some(count))?;
            per_subject_correct.insert(subject, count);
        }

        Ok(ExamRecord {
            date,
            total_correct: count_field(kind, &raw.id, "totalCorrect", raw.total_correct)?,
            per_subject_correct,
        })
    }
}

impl TryFrom<RawTopicCompletion> for TopicCompletion {
    type Error = ActivityError;

    fn try_from(raw: RawTopicCompletion) -> Result<Self, Self::Error> {
        let kind = ActivitySource::TopicCompletions;
        let topic_id = non_blank(raw.topic_id)
            .ok_or_else(|| ActivityError::invalid(kind, &raw.id, "missing topic id"))?;
        let completed_at = raw
            .completed_at
            .ok_or_else(|| ActivityError::invalid(kind, &raw.id, "missing completion timestamp"))?;
        let incidence = match non_blank(raw.incidence) {
            None => None,
            Some(label) => Some(
                label
                    .parse::<Incidence>()
                    .map_err(|reason| ActivityError::invalid(kind, &raw.id, reason))?,
            ),
        };

        Ok(TopicCompletion {
            topic_id,
            completed_at,
            incidence,
            completed: raw.completed.unwrap_or(false),
        })
    }
}
