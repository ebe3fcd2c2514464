//! Activities module - the read-only study activity log consumed by goals.
//!
//! Raw rows coming from the log store are loosely typed. They are validated
//! into DTOs once, at ingestion, and the goals engine only ever sees the
//! validated [`ActivitySnapshot`].

mod activities_errors;
mod activities_model;
mod activities_snapshot;
mod activities_traits;


pub use activities_errors::ActivityError;
pub use activities_model::{
    ActivitySource, ExamRecord, Incidence, RawExamRecord, RawStudySession, RawTopicCompletion,
    StudySession, TopicCompletion,
};
pub use activities_snapshot::{load_activity_snapshot, ActivitySnapshot, SourceSet};
pub use activities_traits::ActivityLogReaderTrait;
