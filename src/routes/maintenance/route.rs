use axum::{Json, Router, extract::State, routing::post};

use crate::app::AppState;
use crate::extractor::CurrentActor;
use crate::routes::error::{ApiResult, ErrorBody};
use crate::services::BackfillReport;

pub fn create_route() -> Router<AppState> {
    Router::new().route(
        "/api/v1/maintenance/completion-backfill",
        post(run_completion_backfill),
    )
}

/// Mark every retained allocation of a closed batch as completed
///
/// Safe to re-run; allocations that are already completed are left untouched.
#[utoipa::path(
    post,
    path = "/api/v1/maintenance/completion-backfill",
    responses(
        (status = 200, description = "Backfill finished", body = BackfillReport),
        (status = 401, description = "Missing actor header", body = ErrorBody),
    ),
    tag = "Maintenance"
)]
pub async fn run_completion_backfill(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<Json<BackfillReport>> {
    let report = state.backfill.fix_closed_batch_allocations(&actor).await?;
    Ok(Json(report))
}
