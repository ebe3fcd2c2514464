use async_trait::async_trait;
use chrono_tz::Tz;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use studygoals_core::activities::{
    ActivityError, ActivityLogReaderTrait, ActivitySource, RawExamRecord, RawStudySession,
    RawTopicCompletion,
};
use studygoals_core::Result;

use super::model::{ExamRecordDB, StudySessionDB, TopicCompletionDB};
use crate::db::{get_connection, DbConnection};
use crate::errors::StorageError;
use crate::schema::{exam_records, study_sessions, topic_completions};

/// Read-only access to the activity log tables.
///
/// Each read runs on the blocking pool with its own pooled connection, so
/// the three sources can be fetched concurrently. Session and exam dates
/// stored as timestamps are assigned to their local day in `timezone`.
pub struct ActivityLogRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    timezone: Tz,
}

impl ActivityLogRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, timezone: Tz) -> Self {
        Self { pool, timezone }
    }

    async fn read<T, F>(&self, source: ActivitySource, owner_id: &str, query: F) -> Result<Vec<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut DbConnection, &str) -> Result<Vec<T>> + Send + 'static,
    {
        let pool = Arc::clone(&self.pool);
        let owner_id = owner_id.to_string();
        let task = tokio::task::spawn_blocking(move || {
            let mut conn = get_connection(&pool)?;
            query(&mut conn, &owner_id)
        });
        match task.await {
            Ok(rows) => rows,
            Err(e) => Err(ActivityError::SourceFailed {
                source_kind: source,
                message: e.to_string(),
            }
            .into()),
        }
    }
}

#[async_trait]
impl ActivityLogReaderTrait for ActivityLogRepository {
    async fn list_study_sessions(&self, owner_id: &str) -> Result<Vec<RawStudySession>> {
        let tz = self.timezone;
        self.read(ActivitySource::StudySessions, owner_id, move |conn, owner| {
            let rows = study_sessions::table
                .filter(study_sessions::owner_id.eq(owner))
                .select(StudySessionDB::as_select())
                .load::<StudySessionDB>(conn)
                .map_err(StorageError::from)?;
            Ok(rows.into_iter().map(|row| row.into_raw(tz)).collect())
        })
        .await
    }

    async fn list_exam_records(&self, owner_id: &str) -> Result<Vec<RawExamRecord>> {
        let tz = self.timezone;
        self.read(ActivitySource::ExamRecords, owner_id, move |conn, owner| {
            let rows = exam_records::table
                .filter(exam_records::owner_id.eq(owner))
                .select(ExamRecordDB::as_select())
                .load::<ExamRecordDB>(conn)
                .map_err(StorageError::from)?;
            Ok(rows.into_iter().map(|row| row.into_raw(tz)).collect())
        })
        .await
    }

    async fn list_topic_completions(&self, owner_id: &str) -> Result<Vec<RawTopicCompletion>> {
        self.read(ActivitySource::TopicCompletions, owner_id, |conn, owner| {
            let rows = topic_completions::table
                .filter(topic_completions::owner_id.eq(owner))
                .select(TopicCompletionDB::as_select())
                .load::<TopicCompletionDB>(conn)
                .map_err(StorageError::from)?;
            Ok(rows.into_iter().map(RawTopicCompletion::from).collect())
        })
        .await
    }
}
