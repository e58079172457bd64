use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entities::allocation::{self, AllocationState, AllocationStatus, StatusTransition};
use crate::repositories::{CandidateProfile, SortOrder};
use crate::services::allocation_service::AllocationUpdate;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AllocateRequest {
    /// Batch external UUID or internal id.
    #[schema(example = "3f1c2a64-9a57-4d0e-8a39-6a1f3e0b2c11")]
    pub batch_id: String,
    /// Candidate external UUID or internal id.
    #[schema(example = "42")]
    pub candidate_id: String,
    pub state: Option<AllocationState>,
    #[schema(value_type = Option<Object>)]
    pub extras: Option<Value>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAllocationRequest {
    pub is_dropout: Option<bool>,
    #[schema(example = "Relocated to another city")]
    pub dropout_remark: Option<String>,
    pub state: Option<AllocationState>,
    #[schema(value_type = Option<Object>)]
    pub extras: Option<Value>,
    pub note: Option<String>,
}

impl From<UpdateAllocationRequest> for AllocationUpdate {
    fn from(req: UpdateAllocationRequest) -> Self {
        AllocationUpdate {
            is_dropout: req.is_dropout,
            dropout_remark: req.dropout_remark,
            state: req.state,
            extras: req.extras,
            note: req.note,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AllocationListQuery {
    pub status: Option<AllocationStatus>,
    /// Defaults to true.
    pub include_dropouts: Option<bool>,
    pub order: Option<SortOrder>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EligibleQuery {
    /// Only candidates this batch accepts.
    pub batch_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AllocationResponse {
    pub id: i64,
    pub external_id: Uuid,
    pub batch_id: i64,
    pub candidate_id: i64,
    pub state: AllocationState,
    pub is_dropout: bool,
    pub dropout_remark: Option<String>,
    pub status_history: Vec<StatusTransition>,
    #[schema(value_type = Option<Object>)]
    pub extras: Option<Value>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<allocation::Model> for AllocationResponse {
    fn from(model: allocation::Model) -> Self {
        Self {
            state: model.state(),
            status_history: model.history(),
            id: model.id,
            external_id: model.external_id,
            batch_id: model.batch_id,
            candidate_id: model.candidate_id,
            is_dropout: model.is_dropout,
            dropout_remark: model.dropout_remark,
            extras: model.extras,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EligibleCandidateResponse {
    pub id: i64,
    pub external_id: Uuid,
    pub full_name: String,
    pub disability_type: Option<String>,
    pub counseling_status: Option<String>,
}

impl From<CandidateProfile> for EligibleCandidateResponse {
    fn from(profile: CandidateProfile) -> Self {
        Self {
            id: profile.id,
            external_id: profile.external_id,
            full_name: profile.full_name,
            disability_type: profile.disability_type,
            counseling_status: profile.counseling_status,
        }
    }
}
