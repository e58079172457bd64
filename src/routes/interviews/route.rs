use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};

use super::dto::{CreateInterviewRequest, InterviewResponse, UpdateInterviewRequest};
use crate::app::AppState;
use crate::extractor::CurrentActor;
use crate::routes::error::{ApiResult, ErrorBody};
use crate::routes::{parse_batch_ref, parse_candidate_ref};
use crate::services::interview_service::NewInterview;

pub fn create_route() -> Router<AppState> {
    Router::new()
        .route("/api/v1/interviews", post(create_interview))
        .route(
            "/api/v1/interviews/{interview_id}",
            get(get_interview)
                .put(update_interview)
                .delete(delete_interview),
        )
        .route(
            "/api/v1/batches/{batch_id}/interviews",
            get(get_batch_interviews),
        )
        .route(
            "/api/v1/candidates/{candidate_id}/interviews",
            get(get_candidate_interviews),
        )
}

/// Record a mock interview
#[utoipa::path(
    post,
    path = "/api/v1/interviews",
    request_body = CreateInterviewRequest,
    responses(
        (status = 201, description = "Interview created", body = InterviewResponse),
        (status = 404, description = "Batch or candidate not found", body = ErrorBody),
        (status = 422, description = "Rating out of range", body = ErrorBody),
    ),
    tag = "Interviews"
)]
pub async fn create_interview(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(payload): Json<CreateInterviewRequest>,
) -> ApiResult<(StatusCode, Json<InterviewResponse>)> {
    let input = NewInterview {
        batch: parse_batch_ref(&payload.batch_id)?,
        candidate: parse_candidate_ref(&payload.candidate_id)?,
        interviewer: payload.interviewer,
        interview_date: payload.interview_date,
        questions: payload.questions,
        skills: payload.skills,
        feedback: payload.feedback,
        rating: payload.rating,
        status: payload.status,
    };
    let interview = state.interviews.create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(interview.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/interviews/{interview_id}",
    params(("interview_id" = i64, Path, description = "Interview id")),
    responses(
        (status = 200, description = "Interview retrieved", body = InterviewResponse),
        (status = 404, description = "Interview not found", body = ErrorBody),
    ),
    tag = "Interviews"
)]
pub async fn get_interview(
    State(state): State<AppState>,
    Path(interview_id): Path<i64>,
) -> ApiResult<Json<InterviewResponse>> {
    let interview = state.interviews.get(interview_id).await?;
    Ok(Json(interview.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/interviews/{interview_id}",
    params(("interview_id" = i64, Path, description = "Interview id")),
    request_body = UpdateInterviewRequest,
    responses(
        (status = 200, description = "Interview updated", body = InterviewResponse),
        (status = 404, description = "Interview not found", body = ErrorBody),
        (status = 422, description = "Rating out of range", body = ErrorBody),
    ),
    tag = "Interviews"
)]
pub async fn update_interview(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(interview_id): Path<i64>,
    Json(payload): Json<UpdateInterviewRequest>,
) -> ApiResult<Json<InterviewResponse>> {
    let interview = state
        .interviews
        .update(&actor, interview_id, payload.into())
        .await?;
    Ok(Json(interview.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/interviews/{interview_id}",
    params(("interview_id" = i64, Path, description = "Interview id")),
    responses(
        (status = 204, description = "Interview deleted"),
        (status = 404, description = "Interview not found", body = ErrorBody),
    ),
    tag = "Interviews"
)]
pub async fn delete_interview(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(interview_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.interviews.delete(&actor, interview_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/batches/{batch_id}/interviews",
    params(("batch_id" = String, Path, description = "Batch external UUID or internal id")),
    responses(
        (status = 200, description = "Interviews retrieved", body = Vec<InterviewResponse>),
        (status = 404, description = "Batch not found", body = ErrorBody),
    ),
    tag = "Interviews"
)]
pub async fn get_batch_interviews(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> ApiResult<Json<Vec<InterviewResponse>>> {
    let interviews = state
        .interviews
        .get_by_batch(parse_batch_ref(&batch_id)?)
        .await?;
    Ok(Json(interviews.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/candidates/{candidate_id}/interviews",
    params(("candidate_id" = String, Path, description = "Candidate external UUID or internal id")),
    responses(
        (status = 200, description = "Interviews retrieved", body = Vec<InterviewResponse>),
        (status = 404, description = "Candidate not found", body = ErrorBody),
    ),
    tag = "Interviews"
)]
pub async fn get_candidate_interviews(
    State(state): State<AppState>,
    Path(candidate_id): Path<String>,
) -> ApiResult<Json<Vec<InterviewResponse>>> {
    let interviews = state
        .interviews
        .get_by_candidate(parse_candidate_ref(&candidate_id)?)
        .await?;
    Ok(Json(interviews.into_iter().map(Into::into).collect()))
}
