use futures::try_join;
use log::{debug, warn};

use super::activities_errors::ActivityError;
use super::activities_model::{
    ExamRecord, RawExamRecord, RawStudySession, RawTopicCompletion, StudySession, TopicCompletion,
};
use super::activities_traits::ActivityLogReaderTrait;
use crate::Result;

/// Which activity sources a computation needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceSet {
    pub sessions: bool,
    pub exams: bool,
    pub topics: bool,
}

impl SourceSet {
    pub const NONE: SourceSet = SourceSet {
        sessions: false,
        exams: false,
        topics: false,
    };

    pub const ALL: SourceSet = SourceSet {
        sessions: true,
        exams: true,
        topics: true,
    };
}

/// A validated view of one owner's activity log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivitySnapshot {
    pub sessions: Vec<StudySession>,
    pub exams: Vec<ExamRecord>,
    pub topics: Vec<TopicCompletion>,
}

impl ActivitySnapshot {
    /// Validates raw rows into a snapshot. Malformed rows are dropped with a warning.
    pub fn ingest(
        sessions: Vec<RawStudySession>,
        exams: Vec<RawExamRecord>,
        topics: Vec<RawTopicCompletion>,
    ) -> Self {
        ActivitySnapshot {
            sessions: validate_all(sessions),
            exams: validate_all(exams),
            topics: validate_all(topics),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty() && self.exams.is_empty() && self.topics.is_empty()
    }
}

fn validate_all<R, T>(rows: Vec<R>) -> Vec<T>
where
    T: TryFrom<R, Error = ActivityError>,
{
    rows.into_iter()
        .filter_map(|row| match T::try_from(row) {
            Ok(valid) => Some(valid),
            Err(e) => {
                warn!("Skipping activity record: {}", e);
                None
            }
        })
        .collect()
}

/// Reads the requested sources concurrently and validates them.
///
/// Any source failing aborts the whole load; nothing partial is returned.
pub async fn load_activity_snapshot(
    reader: &dyn ActivityLogReaderTrait,
    owner_id: &str,
    sources: SourceSet,
) -> Result<ActivitySnapshot> {
    if sources == SourceSet::NONE {
        return Ok(ActivitySnapshot::default());
    }

    let sessions = async {
        if sources.sessions {
            reader.list_study_sessions(owner_id).await
        } else {
            Ok(Vec::new())
        }
    };
    let exams = async {
        if sources.exams {
            reader.list_exam_records(owner_id).await
        } else {
            Ok(Vec::new())
        }
    };
    let topics = async {
        if sources.topics {
            reader.list_topic_completions(owner_id).await
        } else {
            Ok(Vec::new())
        }
    };

    let (sessions, exams, topics) = try_join!(sessions, exams, topics)?;
    debug!(
        "Loaded activity for {}: {} sessions, {} exams, {} topic events",
        owner_id,
        sessions.len(),
        exams.len(),
        topics.len()
    );

    Ok(ActivitySnapshot::ingest(sessions, exams, topics))
}
