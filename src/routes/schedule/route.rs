use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};

use super::dto::{
    CreateEventRequest, CreatePlanEntryRequest, EventResponse, PlanEntryResponse,
    UpdatePlanEntryRequest, WeeklyPlanQuery,
};
use crate::app::AppState;
use crate::extractor::CurrentActor;
use crate::routes::error::{ApiResult, ErrorBody};
use crate::routes::parse_batch_ref;
use crate::services::schedule_service::{NewEvent, NewPlanEntry};

pub fn create_route() -> Router<AppState> {
    Router::new()
        .route("/api/v1/plans", post(create_plan_entry))
        .route(
            "/api/v1/plans/{plan_id}",
            put(update_plan_entry).delete(delete_plan_entry),
        )
        .route("/api/v1/batches/{batch_id}/plans", get(get_full_plan))
        .route("/api/v1/batches/{batch_id}/plans/weekly", get(get_weekly_plan))
        .route("/api/v1/events", post(create_event))
        .route("/api/v1/events/{event_id}", delete(delete_event))
        .route("/api/v1/batches/{batch_id}/events", get(get_events))
}

/// Add a slot to the batch schedule
#[utoipa::path(
    post,
    path = "/api/v1/plans",
    request_body = CreatePlanEntryRequest,
    responses(
        (status = 201, description = "Plan entry created", body = PlanEntryResponse),
        (status = 404, description = "Batch not found", body = ErrorBody),
        (status = 422, description = "Bad time range or daily course cap exceeded", body = ErrorBody),
    ),
    tag = "Schedule"
)]
pub async fn create_plan_entry(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(payload): Json<CreatePlanEntryRequest>,
) -> ApiResult<(StatusCode, Json<PlanEntryResponse>)> {
    let input = NewPlanEntry {
        batch: parse_batch_ref(&payload.batch_id)?,
        date: payload.date,
        start_time: payload.start_time,
        end_time: payload.end_time,
        activity_type: payload.activity_type,
        activity_name: payload.activity_name,
        trainer: payload.trainer,
        notes: payload.notes,
    };
    let entry = state.schedule.create_plan_entry(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// Change a schedule slot
#[utoipa::path(
    put,
    path = "/api/v1/plans/{plan_id}",
    params(("plan_id" = i64, Path, description = "Plan entry id")),
    request_body = UpdatePlanEntryRequest,
    responses(
        (status = 200, description = "Plan entry updated", body = PlanEntryResponse),
        (status = 404, description = "Plan entry not found", body = ErrorBody),
        (status = 422, description = "Bad time range or daily course cap exceeded", body = ErrorBody),
    ),
    tag = "Schedule"
)]
pub async fn update_plan_entry(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(plan_id): Path<i64>,
    Json(payload): Json<UpdatePlanEntryRequest>,
) -> ApiResult<Json<PlanEntryResponse>> {
    let entry = state
        .schedule
        .update_plan_entry(&actor, plan_id, payload.into())
        .await?;
    Ok(Json(entry.into()))
}

/// Remove a schedule slot
#[utoipa::path(
    delete,
    path = "/api/v1/plans/{plan_id}",
    params(("plan_id" = i64, Path, description = "Plan entry id")),
    responses(
        (status = 204, description = "Plan entry deleted"),
        (status = 404, description = "Plan entry not found", body = ErrorBody),
    ),
    tag = "Schedule"
)]
pub async fn delete_plan_entry(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(plan_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.schedule.delete_plan_entry(&actor, plan_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Full schedule of a batch
#[utoipa::path(
    get,
    path = "/api/v1/batches/{batch_id}/plans",
    params(("batch_id" = String, Path, description = "Batch external UUID or internal id")),
    responses(
        (status = 200, description = "Schedule retrieved", body = Vec<PlanEntryResponse>),
        (status = 404, description = "Batch not found", body = ErrorBody),
    ),
    tag = "Schedule"
)]
pub async fn get_full_plan(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> ApiResult<Json<Vec<PlanEntryResponse>>> {
    let entries = state.schedule.get_full_plan(parse_batch_ref(&batch_id)?).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// Seven days of schedule starting at `start_date`
#[utoipa::path(
    get,
    path = "/api/v1/batches/{batch_id}/plans/weekly",
    params(
        ("batch_id" = String, Path, description = "Batch external UUID or internal id"),
        WeeklyPlanQuery
    ),
    responses(
        (status = 200, description = "Schedule retrieved", body = Vec<PlanEntryResponse>),
        (status = 404, description = "Batch not found", body = ErrorBody),
    ),
    tag = "Schedule"
)]
pub async fn get_weekly_plan(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
    Query(query): Query<WeeklyPlanQuery>,
) -> ApiResult<Json<Vec<PlanEntryResponse>>> {
    let entries = state
        .schedule
        .get_weekly_plan(parse_batch_ref(&batch_id)?, query.start_date)
        .await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// Add a holiday or event to the batch calendar
#[utoipa::path(
    post,
    path = "/api/v1/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 404, description = "Batch not found", body = ErrorBody),
    ),
    tag = "Schedule"
)]
pub async fn create_event(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(payload): Json<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<EventResponse>)> {
    let input = NewEvent {
        batch: parse_batch_ref(&payload.batch_id)?,
        date: payload.date,
        event_type: payload.event_type,
        title: payload.title,
        description: payload.description,
    };
    let event = state.schedule.create_event(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(event.into())))
}

/// Calendar events of a batch
#[utoipa::path(
    get,
    path = "/api/v1/batches/{batch_id}/events",
    params(("batch_id" = String, Path, description = "Batch external UUID or internal id")),
    responses(
        (status = 200, description = "Events retrieved", body = Vec<EventResponse>),
        (status = 404, description = "Batch not found", body = ErrorBody),
    ),
    tag = "Schedule"
)]
pub async fn get_events(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> ApiResult<Json<Vec<EventResponse>>> {
    let events = state.schedule.get_events(parse_batch_ref(&batch_id)?).await?;
    Ok(Json(events.into_iter().map(Into::into).collect()))
}

/// Remove a calendar event
#[utoipa::path(
    delete,
    path = "/api/v1/events/{event_id}",
    params(("event_id" = i64, Path, description = "Event id")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "Event not found", body = ErrorBody),
    ),
    tag = "Schedule"
)]
pub async fn delete_event(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(event_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.schedule.delete_event(&actor, event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
