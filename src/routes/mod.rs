pub mod allocations;
pub mod attendance;
pub mod batches;
pub mod error;
pub mod health;
pub mod interviews;
pub mod maintenance;
pub mod schedule;
pub mod scored_records;

use crate::repositories::{BatchRef, CandidateRef};
use error::ApiError;

pub fn parse_batch_ref(raw: &str) -> Result<BatchRef, ApiError> {
    BatchRef::parse(raw.trim())
        .ok_or_else(|| ApiError::BadRequest(format!("invalid batch id: {raw}")))
}

pub fn parse_candidate_ref(raw: &str) -> Result<CandidateRef, ApiError> {
    CandidateRef::parse(raw.trim())
        .ok_or_else(|| ApiError::BadRequest(format!("invalid candidate id: {raw}")))
}
