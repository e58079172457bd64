use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};

use super::dto::{
    BatchDetailResponse, BatchListQuery, BatchListResponse, BatchResponse, CreateBatchRequest,
    ExtendBatchRequest, UpdateBatchRequest,
};
use crate::app::AppState;
use crate::config::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::extractor::CurrentActor;
use crate::repositories::BatchFilter;
use crate::routes::error::{ApiResult, ErrorBody};
use crate::routes::parse_batch_ref;

pub fn create_route() -> Router<AppState> {
    Router::new()
        .route("/api/v1/batches", post(create_batch).get(list_batches))
        .route(
            "/api/v1/batches/{batch_id}",
            get(get_batch).put(update_batch).delete(delete_batch),
        )
        .route("/api/v1/batches/{batch_id}/extensions", post(extend_batch))
}

/// Create a batch
#[utoipa::path(
    post,
    path = "/api/v1/batches",
    request_body = CreateBatchRequest,
    responses(
        (status = 201, description = "Batch created", body = BatchResponse),
        (status = 422, description = "Invalid batch", body = ErrorBody),
    ),
    tag = "Batches"
)]
pub async fn create_batch(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(payload): Json<CreateBatchRequest>,
) -> ApiResult<(StatusCode, Json<BatchResponse>)> {
    let batch = state.batches.create(&actor, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(batch.into())))
}

/// List batches
#[utoipa::path(
    get,
    path = "/api/v1/batches",
    params(BatchListQuery),
    responses(
        (status = 200, description = "Batches retrieved", body = BatchListResponse),
    ),
    tag = "Batches"
)]
pub async fn list_batches(
    State(state): State<AppState>,
    Query(query): Query<BatchListQuery>,
) -> ApiResult<Json<BatchListResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let filter = BatchFilter {
        search: query.search,
        status: query.status,
        disability_tag: query.disability_tag,
        sort_by: query.sort_by.unwrap_or_default(),
        order: query.order.unwrap_or_default(),
    };

    let (items, total) = state.batches.list(&filter, page, page_size).await?;
    Ok(Json(BatchListResponse {
        items: items.into_iter().map(Into::into).collect(),
        total,
        page,
        page_size,
    }))
}

/// Get a batch with its extension history
#[utoipa::path(
    get,
    path = "/api/v1/batches/{batch_id}",
    params(("batch_id" = String, Path, description = "Batch external UUID or internal id")),
    responses(
        (status = 200, description = "Batch retrieved", body = BatchDetailResponse),
        (status = 404, description = "Batch not found", body = ErrorBody),
    ),
    tag = "Batches"
)]
pub async fn get_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> ApiResult<Json<BatchDetailResponse>> {
    let details = state.batches.get(parse_batch_ref(&batch_id)?).await?;
    Ok(Json(details.into()))
}

/// Update batch fields or status
#[utoipa::path(
    put,
    path = "/api/v1/batches/{batch_id}",
    params(("batch_id" = String, Path, description = "Batch external UUID or internal id")),
    request_body = UpdateBatchRequest,
    responses(
        (status = 200, description = "Batch updated", body = BatchResponse),
        (status = 404, description = "Batch not found", body = ErrorBody),
        (status = 422, description = "Illegal status transition", body = ErrorBody),
    ),
    tag = "Batches"
)]
pub async fn update_batch(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(batch_id): Path<String>,
    Json(payload): Json<UpdateBatchRequest>,
) -> ApiResult<Json<BatchResponse>> {
    let batch = state
        .batches
        .update(&actor, parse_batch_ref(&batch_id)?, payload.into())
        .await?;
    Ok(Json(batch.into()))
}

/// Extend the batch close date
#[utoipa::path(
    post,
    path = "/api/v1/batches/{batch_id}/extensions",
    params(("batch_id" = String, Path, description = "Batch external UUID or internal id")),
    request_body = ExtendBatchRequest,
    responses(
        (status = 200, description = "Batch extended", body = BatchDetailResponse),
        (status = 409, description = "Close date changed concurrently", body = ErrorBody),
        (status = 422, description = "New date is not after the current one", body = ErrorBody),
    ),
    tag = "Batches"
)]
pub async fn extend_batch(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(batch_id): Path<String>,
    Json(payload): Json<ExtendBatchRequest>,
) -> ApiResult<Json<BatchDetailResponse>> {
    let details = state
        .batches
        .extend(
            &actor,
            parse_batch_ref(&batch_id)?,
            payload.new_close_date,
            payload.reason,
        )
        .await?;
    Ok(Json(details.into()))
}

/// Soft-delete a batch
#[utoipa::path(
    delete,
    path = "/api/v1/batches/{batch_id}",
    params(("batch_id" = String, Path, description = "Batch external UUID or internal id")),
    responses(
        (status = 204, description = "Batch deleted"),
        (status = 404, description = "Batch not found", body = ErrorBody),
    ),
    tag = "Batches"
)]
pub async fn delete_batch(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(batch_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.batches.delete(&actor, parse_batch_ref(&batch_id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
