use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};

use super::dto::{
    BulkScoredRecordRequest, DeleteByNameResponse, ScoredRecordRequest, ScoredRecordResponse,
};
use crate::app::AppState;
use crate::entities::scored_record::RecordKind;
use crate::extractor::CurrentActor;
use crate::routes::error::{ApiError, ApiResult, ErrorBody};
use crate::routes::{parse_batch_ref, parse_candidate_ref};
use crate::services::scored_record_service::ScoredRecordInput;

pub fn create_route() -> Router<AppState> {
    Router::new()
        .route("/api/v1/scored-records/{kind}", post(create_record))
        .route("/api/v1/scored-records/{kind}/bulk", post(bulk_upsert_records))
        .route(
            "/api/v1/batches/{batch_id}/scored-records/{kind}",
            get(get_batch_records),
        )
        .route(
            "/api/v1/batches/{batch_id}/scored-records/{kind}/{name}",
            delete(delete_records_by_name),
        )
}

fn to_input(request: ScoredRecordRequest) -> Result<ScoredRecordInput, ApiError> {
    Ok(ScoredRecordInput {
        batch: parse_batch_ref(&request.batch_id)?,
        candidate: parse_candidate_ref(&request.candidate_id)?,
        name: request.name,
        trainer_id: request.trainer_id,
        marks_obtained: request.marks_obtained,
        max_marks: request.max_marks,
        record_date: request.date,
        submission_date: request.submission_date,
        course_marks: request.course_marks,
    })
}

/// Create an assessment or assignment record
#[utoipa::path(
    post,
    path = "/api/v1/scored-records/{kind}",
    params(("kind" = RecordKind, Path, description = "assessment or assignment")),
    request_body = ScoredRecordRequest,
    responses(
        (status = 201, description = "Record created", body = ScoredRecordResponse),
        (status = 409, description = "Record with this name already exists", body = ErrorBody),
    ),
    tag = "Scored records"
)]
pub async fn create_record(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(kind): Path<RecordKind>,
    Json(payload): Json<ScoredRecordRequest>,
) -> ApiResult<(StatusCode, Json<ScoredRecordResponse>)> {
    let record = state
        .scored_records
        .create(&actor, kind, to_input(payload)?)
        .await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// Create or overwrite records by (kind, batch, candidate, name)
#[utoipa::path(
    post,
    path = "/api/v1/scored-records/{kind}/bulk",
    params(("kind" = RecordKind, Path, description = "assessment or assignment")),
    request_body = BulkScoredRecordRequest,
    responses(
        (status = 200, description = "Records stored", body = Vec<ScoredRecordResponse>),
        (status = 404, description = "Batch or candidate not found", body = ErrorBody),
    ),
    tag = "Scored records"
)]
pub async fn bulk_upsert_records(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(kind): Path<RecordKind>,
    Json(payload): Json<BulkScoredRecordRequest>,
) -> ApiResult<Json<Vec<ScoredRecordResponse>>> {
    let inputs = payload
        .records
        .into_iter()
        .map(to_input)
        .collect::<ApiResult<Vec<_>>>()?;
    let records = state.scored_records.bulk_upsert(&actor, kind, inputs).await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// Records of a batch
#[utoipa::path(
    get,
    path = "/api/v1/batches/{batch_id}/scored-records/{kind}",
    params(
        ("batch_id" = String, Path, description = "Batch external UUID or internal id"),
        ("kind" = RecordKind, Path, description = "assessment or assignment")
    ),
    responses(
        (status = 200, description = "Records retrieved", body = Vec<ScoredRecordResponse>),
        (status = 404, description = "Batch not found", body = ErrorBody),
    ),
    tag = "Scored records"
)]
pub async fn get_batch_records(
    State(state): State<AppState>,
    Path((batch_id, kind)): Path<(String, RecordKind)>,
) -> ApiResult<Json<Vec<ScoredRecordResponse>>> {
    let records = state
        .scored_records
        .get_by_batch(kind, parse_batch_ref(&batch_id)?)
        .await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// Delete every record with this name in the batch
#[utoipa::path(
    delete,
    path = "/api/v1/batches/{batch_id}/scored-records/{kind}/{name}",
    params(
        ("batch_id" = String, Path, description = "Batch external UUID or internal id"),
        ("kind" = RecordKind, Path, description = "assessment or assignment"),
        ("name" = String, Path, description = "Record name")
    ),
    responses(
        (status = 200, description = "Records deleted", body = DeleteByNameResponse),
        (status = 404, description = "Batch not found", body = ErrorBody),
    ),
    tag = "Scored records"
)]
pub async fn delete_records_by_name(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((batch_id, kind, name)): Path<(String, RecordKind, String)>,
) -> ApiResult<Json<DeleteByNameResponse>> {
    let deleted = state
        .scored_records
        .delete_by_name(&actor, kind, parse_batch_ref(&batch_id)?, &name)
        .await?;
    Ok(Json(DeleteByNameResponse { deleted }))
}
