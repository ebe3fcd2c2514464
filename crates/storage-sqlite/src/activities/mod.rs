//! SQLite access to the activity log (study sessions, mock exams, topic completions).

mod model;
mod repository;

pub use model::{ExamRecordDB, StudySessionDB, TopicCompletionDB};
pub use repository::ActivityLogRepository;
