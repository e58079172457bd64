use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};

use super::dto::{
    AllocateRequest, AllocationListQuery, AllocationResponse, EligibleCandidateResponse,
    EligibleQuery, UpdateAllocationRequest,
};
use crate::app::AppState;
use crate::extractor::CurrentActor;
use crate::repositories::AllocationListFilter;
use crate::routes::error::{ApiResult, ErrorBody};
use crate::routes::{parse_batch_ref, parse_candidate_ref};
use crate::services::allocation_service::NewAllocation;

pub fn create_route() -> Router<AppState> {
    Router::new()
        .route("/api/v1/allocations", post(allocate))
        .route("/api/v1/allocations/eligible", get(list_eligible))
        .route(
            "/api/v1/allocations/{allocation_id}",
            put(update_allocation).delete(remove_allocation),
        )
        .route("/api/v1/batches/{batch_id}/allocations", get(list_by_batch))
        .route(
            "/api/v1/candidates/{candidate_id}/allocations",
            get(list_by_candidate),
        )
}

/// Allocate a candidate to a batch
#[utoipa::path(
    post,
    path = "/api/v1/allocations",
    request_body = AllocateRequest,
    responses(
        (status = 201, description = "Candidate allocated", body = AllocationResponse),
        (status = 404, description = "Batch or candidate not found", body = ErrorBody),
        (status = 409, description = "Already allocated, active elsewhere or disability mismatch", body = ErrorBody),
    ),
    tag = "Allocations"
)]
pub async fn allocate(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(payload): Json<AllocateRequest>,
) -> ApiResult<(StatusCode, Json<AllocationResponse>)> {
    let input = NewAllocation {
        batch: parse_batch_ref(&payload.batch_id)?,
        candidate: parse_candidate_ref(&payload.candidate_id)?,
        state: payload.state,
        extras: payload.extras,
    };
    let allocation = state.allocations.allocate(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(allocation.into())))
}

/// Update an allocation, including dropout and reinstatement
#[utoipa::path(
    put,
    path = "/api/v1/allocations/{allocation_id}",
    params(("allocation_id" = i64, Path, description = "Allocation id")),
    request_body = UpdateAllocationRequest,
    responses(
        (status = 200, description = "Allocation updated", body = AllocationResponse),
        (status = 404, description = "Allocation not found", body = ErrorBody),
        (status = 422, description = "Dropout remark missing", body = ErrorBody),
    ),
    tag = "Allocations"
)]
pub async fn update_allocation(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(allocation_id): Path<i64>,
    Json(payload): Json<UpdateAllocationRequest>,
) -> ApiResult<Json<AllocationResponse>> {
    let allocation = state
        .allocations
        .update(&actor, allocation_id, payload.into())
        .await?;
    Ok(Json(allocation.into()))
}

/// Remove an allocation
#[utoipa::path(
    delete,
    path = "/api/v1/allocations/{allocation_id}",
    params(("allocation_id" = i64, Path, description = "Allocation id")),
    responses(
        (status = 204, description = "Allocation removed"),
        (status = 404, description = "Allocation not found", body = ErrorBody),
    ),
    tag = "Allocations"
)]
pub async fn remove_allocation(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(allocation_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.allocations.remove(&actor, allocation_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Candidates that can be allocated
#[utoipa::path(
    get,
    path = "/api/v1/allocations/eligible",
    params(EligibleQuery),
    responses(
        (status = 200, description = "Eligible candidates", body = Vec<EligibleCandidateResponse>),
        (status = 404, description = "Batch not found", body = ErrorBody),
    ),
    tag = "Allocations"
)]
pub async fn list_eligible(
    State(state): State<AppState>,
    Query(query): Query<EligibleQuery>,
) -> ApiResult<Json<Vec<EligibleCandidateResponse>>> {
    let batch_ref = query.batch_id.as_deref().map(parse_batch_ref).transpose()?;
    let candidates = state.allocations.list_eligible(batch_ref).await?;
    Ok(Json(candidates.into_iter().map(Into::into).collect()))
}

/// Allocations of a batch
#[utoipa::path(
    get,
    path = "/api/v1/batches/{batch_id}/allocations",
    params(
        ("batch_id" = String, Path, description = "Batch external UUID or internal id"),
        AllocationListQuery
    ),
    responses(
        (status = 200, description = "Allocations retrieved", body = Vec<AllocationResponse>),
        (status = 404, description = "Batch not found", body = ErrorBody),
    ),
    tag = "Allocations"
)]
pub async fn list_by_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
    Query(query): Query<AllocationListQuery>,
) -> ApiResult<Json<Vec<AllocationResponse>>> {
    let filter = AllocationListFilter {
        status: query.status,
        include_dropouts: query.include_dropouts.unwrap_or(true),
        order: query.order.unwrap_or(crate::repositories::SortOrder::Asc),
    };
    let allocations = state
        .allocations
        .list_by_batch(parse_batch_ref(&batch_id)?, &filter)
        .await?;
    Ok(Json(allocations.into_iter().map(Into::into).collect()))
}

/// Allocations of a candidate
#[utoipa::path(
    get,
    path = "/api/v1/candidates/{candidate_id}/allocations",
    params(("candidate_id" = String, Path, description = "Candidate external UUID or internal id")),
    responses(
        (status = 200, description = "Allocations retrieved", body = Vec<AllocationResponse>),
        (status = 404, description = "Candidate not found", body = ErrorBody),
    ),
    tag = "Allocations"
)]
pub async fn list_by_candidate(
    State(state): State<AppState>,
    Path(candidate_id): Path<String>,
) -> ApiResult<Json<Vec<AllocationResponse>>> {
    let allocations = state
        .allocations
        .list_by_candidate(parse_candidate_ref(&candidate_id)?)
        .await?;
    Ok(Json(allocations.into_iter().map(Into::into).collect()))
}
