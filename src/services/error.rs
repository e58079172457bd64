use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    ValidationError,
    BlockedOperation,
    Infrastructure,
}

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("candidate {candidate} is already allocated to batch {batch}")]
    AlreadyAllocated { batch: String, candidate: String },

    #[error("candidate {candidate} already holds an active allocation in batch {batch}")]
    ActiveElsewhere { batch: String, candidate: String },

    #[error("candidate disability type {candidate_type:?} does not match batch tags {batch_tags:?}")]
    DisabilityMismatch {
        candidate_type: Option<String>,
        batch_tags: Vec<String>,
    },

    #[error("{kind} {name} already exists for candidate {candidate} in batch {batch}")]
    DuplicateRecord {
        kind: &'static str,
        name: String,
        batch: String,
        candidate: String,
    },

    #[error("{resource} was modified concurrently, retry the operation")]
    ConcurrentModification { resource: &'static str },

    #[error("new close date {new_close_date} must be after current close date {current_close_date}")]
    InvalidExtension {
        current_close_date: chrono::NaiveDate,
        new_close_date: chrono::NaiveDate,
    },

    #[error("end time {end} must be after start time {start}")]
    InvalidTimeRange {
        start: chrono::NaiveTime,
        end: chrono::NaiveTime,
    },

    #[error(
        "course {activity_name} on {date} would total {total_minutes} minutes, the daily cap is {cap_minutes} minutes"
    )]
    CourseCapExceeded {
        activity_name: String,
        date: chrono::NaiveDate,
        total_minutes: i64,
        cap_minutes: i64,
    },

    #[error("a dropout remark is required when marking a dropout")]
    RemarkRequired,

    #[error("batch status cannot move from {from} to {to}")]
    InvalidStatusTransition { from: &'static str, to: &'static str },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("candidate {candidate} dropped out of batch {batch}, attendance is blocked")]
    DropoutAttendanceBlocked { batch: String, candidate: String },

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl TrainingError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TrainingError::NotFound { .. } => ErrorKind::NotFound,
            TrainingError::AlreadyAllocated { .. }
            | TrainingError::ActiveElsewhere { .. }
            | TrainingError::DisabilityMismatch { .. }
            | TrainingError::DuplicateRecord { .. }
            | TrainingError::ConcurrentModification { .. } => ErrorKind::Conflict,
            TrainingError::InvalidExtension { .. }
            | TrainingError::InvalidTimeRange { .. }
            | TrainingError::CourseCapExceeded { .. }
            | TrainingError::RemarkRequired
            | TrainingError::InvalidStatusTransition { .. }
            | TrainingError::InvalidInput(_) => ErrorKind::ValidationError,
            TrainingError::DropoutAttendanceBlocked { .. } => ErrorKind::BlockedOperation,
            TrainingError::Database(_) => ErrorKind::Infrastructure,
        }
    }
}

/// True when the database rejected a write because of a unique index.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Driver message of a unique-index rejection. Postgres names the index,
/// SQLite lists the columns.
pub fn unique_violation_detail(err: &DbErr) -> Option<String> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => Some(detail),
        _ => None,
    }
}

pub type TrainingResult<T> = Result<T, TrainingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_taxonomy() {
        assert_eq!(
            TrainingError::not_found("batch", 7).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(TrainingError::RemarkRequired.kind(), ErrorKind::ValidationError);
        assert_eq!(
            TrainingError::DropoutAttendanceBlocked {
                batch: "b".into(),
                candidate: "c".into(),
            }
            .kind(),
            ErrorKind::BlockedOperation
        );
        assert_eq!(
            TrainingError::Database(DbErr::Custom("boom".into())).kind(),
            ErrorKind::Infrastructure
        );
    }

    #[test]
    fn not_found_message_names_the_entity() {
        let err = TrainingError::not_found("allocation", "42");
        assert_eq!(err.to_string(), "allocation not found: 42");
    }
}
