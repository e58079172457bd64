pub mod allocation_service;
pub mod attendance_service;
pub mod batch_service;
pub mod completion_backfill;
pub mod error;
pub mod interview_service;
pub mod schedule_service;
pub mod scored_record_service;

use sea_orm::ConnectionTrait;

use crate::entities::batch;
use crate::repositories::{BatchRef, BatchRepository, CandidateDirectory, CandidateProfile, CandidateRef};

pub use allocation_service::AllocationService;
pub use attendance_service::AttendanceService;
pub use batch_service::BatchService;
pub use completion_backfill::{BackfillReport, CompletionBackfill};
pub use error::{ErrorKind, TrainingError, TrainingResult};
pub use interview_service::InterviewService;
pub use schedule_service::ScheduleService;
pub use scored_record_service::ScoredRecordService;

pub(crate) async fn require_batch<C: ConnectionTrait>(
    db: &C,
    batch_ref: BatchRef,
) -> TrainingResult<batch::Model> {
    BatchRepository::new()
        .resolve(db, batch_ref)
        .await?
        .ok_or_else(|| TrainingError::not_found("batch", batch_ref))
}

pub(crate) async fn require_candidate<C: ConnectionTrait>(
    db: &C,
    candidate_ref: CandidateRef,
) -> TrainingResult<CandidateProfile> {
    CandidateDirectory::new()
        .find(db, candidate_ref)
        .await?
        .ok_or_else(|| TrainingError::not_found("candidate", candidate_ref))
}

/// Trims and drops blank optional text.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
