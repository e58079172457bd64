use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::Serialize;
use utoipa::ToSchema;

use crate::services::{ErrorKind, TrainingError};

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "batch not found: 42")]
    pub error: String,
    #[schema(example = "not_found")]
    pub kind: String,
}

#[derive(Debug)]
pub enum ApiError {
    Domain(TrainingError),
    BadRequest(String),
    Unauthorized(String),
}

impl From<TrainingError> for ApiError {
    fn from(err: TrainingError) -> Self {
        ApiError::Domain(err)
    }
}

fn kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NotFound => "not_found",
        ErrorKind::Conflict => "conflict",
        ErrorKind::ValidationError => "validation_error",
        ErrorKind::BlockedOperation => "blocked_operation",
        ErrorKind::Infrastructure => "infrastructure",
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::BlockedOperation => StatusCode::FORBIDDEN,
        ErrorKind::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Domain(err) => {
                let kind = err.kind();
                let error = if kind == ErrorKind::Infrastructure {
                    tracing::error!("request failed: {}", err);
                    "internal server error".to_string()
                } else {
                    err.to_string()
                };
                (
                    status_for(kind),
                    ErrorBody {
                        error,
                        kind: kind_label(kind).to_string(),
                    },
                )
            }
            ApiError::BadRequest(error) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error,
                    kind: "bad_request".to_string(),
                },
            ),
            ApiError::Unauthorized(error) => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error,
                    kind: "unauthorized".to_string(),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_status_codes() {
        let cases = [
            (TrainingError::not_found("batch", 1), StatusCode::NOT_FOUND),
            (
                TrainingError::ConcurrentModification { resource: "batch" },
                StatusCode::CONFLICT,
            ),
            (TrainingError::RemarkRequired, StatusCode::UNPROCESSABLE_ENTITY),
            (
                TrainingError::DropoutAttendanceBlocked {
                    batch: "b".into(),
                    candidate: "c".into(),
                },
                StatusCode::FORBIDDEN,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }
}
