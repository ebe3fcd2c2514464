use thiserror::Error;

use super::activities_model::ActivitySource;

/// Errors raised while reading or validating activity log records.
#[derive(Error, Debug)]
pub enum ActivityError {
    #[error("Invalid {source_kind} record '{record_id}': {reason}")]
    InvalidRecord {
        source_kind: ActivitySource,
        record_id: String,
        reason: String,
    },

    #[error("Failed to read {source_kind}: {message}")]
    SourceFailed {
        source_kind: ActivitySource,
        message: String,
    },
}

impl ActivityError {
    pub(crate) fn invalid(
        source_kind: ActivitySource,
        record_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ActivityError::InvalidRecord {
            source_kind,
            record_id: record_id.into(),
            reason: reason.into(),
        }
    }
}
