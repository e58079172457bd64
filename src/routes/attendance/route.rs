use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};

use super::dto::{
    AttendanceEntryResponse, AttendanceRangeQuery, AttendanceResponse, BulkAttendanceRequest,
    CandidateAttendanceQuery,
};
use crate::app::AppState;
use crate::extractor::CurrentActor;
use crate::routes::error::{ApiResult, ErrorBody};
use crate::routes::{parse_batch_ref, parse_candidate_ref};
use crate::services::attendance_service::AttendanceInput;

pub fn create_route() -> Router<AppState> {
    Router::new()
        .route("/api/v1/attendance/bulk", post(bulk_upsert_attendance))
        .route("/api/v1/batches/{batch_id}/attendance", get(get_batch_attendance))
        .route(
            "/api/v1/candidates/{candidate_id}/attendance",
            get(get_candidate_attendance),
        )
}

/// Record attendance in bulk
///
/// Records sharing batch, candidate, date and period overwrite each other.
/// Either every record is stored or none is.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/bulk",
    request_body = BulkAttendanceRequest,
    responses(
        (status = 200, description = "Attendance stored", body = Vec<AttendanceEntryResponse>),
        (status = 403, description = "Candidate dropped out of the batch", body = ErrorBody),
        (status = 404, description = "Batch, candidate, allocation or period not found", body = ErrorBody),
    ),
    tag = "Attendance"
)]
pub async fn bulk_upsert_attendance(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(payload): Json<BulkAttendanceRequest>,
) -> ApiResult<Json<Vec<AttendanceEntryResponse>>> {
    let records = payload
        .records
        .into_iter()
        .map(|record| {
            Ok(AttendanceInput {
                batch: parse_batch_ref(&record.batch_id)?,
                candidate: parse_candidate_ref(&record.candidate_id)?,
                date: record.date,
                period_id: record.period_id,
                status: record.status,
                remarks: record.remarks,
                trainer_notes: record.trainer_notes,
            })
        })
        .collect::<ApiResult<Vec<_>>>()?;

    let entries = state.attendance.bulk_upsert(&actor, records).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// Attendance of a batch, optionally within a date range
#[utoipa::path(
    get,
    path = "/api/v1/batches/{batch_id}/attendance",
    params(
        ("batch_id" = String, Path, description = "Batch external UUID or internal id"),
        AttendanceRangeQuery
    ),
    responses(
        (status = 200, description = "Attendance retrieved", body = Vec<AttendanceResponse>),
        (status = 404, description = "Batch not found", body = ErrorBody),
    ),
    tag = "Attendance"
)]
pub async fn get_batch_attendance(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
    Query(query): Query<AttendanceRangeQuery>,
) -> ApiResult<Json<Vec<AttendanceResponse>>> {
    let records = state
        .attendance
        .get_attendance(parse_batch_ref(&batch_id)?, query.from, query.to)
        .await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// Attendance of a candidate
#[utoipa::path(
    get,
    path = "/api/v1/candidates/{candidate_id}/attendance",
    params(
        ("candidate_id" = String, Path, description = "Candidate external UUID or internal id"),
        CandidateAttendanceQuery
    ),
    responses(
        (status = 200, description = "Attendance retrieved", body = Vec<AttendanceResponse>),
        (status = 404, description = "Candidate not found", body = ErrorBody),
    ),
    tag = "Attendance"
)]
pub async fn get_candidate_attendance(
    State(state): State<AppState>,
    Path(candidate_id): Path<String>,
    Query(query): Query<CandidateAttendanceQuery>,
) -> ApiResult<Json<Vec<AttendanceResponse>>> {
    let batch_ref = query.batch_id.as_deref().map(parse_batch_ref).transpose()?;
    let records = state
        .attendance
        .get_by_candidate(parse_candidate_ref(&candidate_id)?, batch_ref)
        .await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}
