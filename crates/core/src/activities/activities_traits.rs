use async_trait::async_trait;

use super::activities_model::{RawExamRecord, RawStudySession, RawTopicCompletion};
use crate::Result;

/// Read-only access to a student's activity log.
///
/// The three sources are independent, so callers may query them concurrently.
#[async_trait]
pub trait ActivityLogReaderTrait: Send + Sync {
    async fn list_study_sessions(&self, owner_id: &str) -> Result<Vec<RawStudySession>>;
    async fn list_exam_records(&self, owner_id: &str) -> Result<Vec<RawExamRecord>>;
    async fn list_topic_completions(&self, owner_id: &str) -> Result<Vec<RawTopicCompletion>>;
}
