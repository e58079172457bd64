use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entities::batch::BatchStatus;
use crate::entities::{batch, batch_extension};
use crate::repositories::{BatchSortField, SortOrder};
use crate::services::batch_service::{BatchDetails, BatchUpdate, NewBatch};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBatchRequest {
    #[schema(example = "Data Entry Cohort 12")]
    pub name: String,

    #[serde(default)]
    #[schema(example = json!(["visual", "hearing"]))]
    pub disability_tags: Vec<String>,

    pub start_date: NaiveDate,

    pub approx_close_date: NaiveDate,

    #[schema(value_type = Option<Object>)]
    pub courses: Option<Value>,

    pub status: Option<BatchStatus>,
}

impl From<CreateBatchRequest> for NewBatch {
    fn from(req: CreateBatchRequest) -> Self {
        NewBatch {
            name: req.name,
            disability_tags: req.disability_tags,
            start_date: req.start_date,
            approx_close_date: req.approx_close_date,
            courses: req.courses,
            status: req.status,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateBatchRequest {
    pub name: Option<String>,
    pub disability_tags: Option<Vec<String>>,
    pub start_date: Option<NaiveDate>,
    pub approx_close_date: Option<NaiveDate>,
    #[schema(value_type = Option<Object>)]
    pub courses: Option<Value>,
    pub status: Option<BatchStatus>,
}

impl From<UpdateBatchRequest> for BatchUpdate {
    fn from(req: UpdateBatchRequest) -> Self {
        BatchUpdate {
            name: req.name,
            disability_tags: req.disability_tags,
            start_date: req.start_date,
            approx_close_date: req.approx_close_date,
            courses: req.courses,
            status: req.status,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExtendBatchRequest {
    pub new_close_date: NaiveDate,
    #[schema(example = "Public holidays in March")]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BatchListQuery {
    /// Matches part of the batch name.
    pub search: Option<String>,
    pub status: Option<BatchStatus>,
    pub disability_tag: Option<String>,
    pub sort_by: Option<BatchSortField>,
    pub order: Option<SortOrder>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchResponse {
    pub id: i64,
    pub external_id: Uuid,
    pub name: String,
    pub disability_tags: Vec<String>,
    pub start_date: NaiveDate,
    pub approx_close_date: NaiveDate,
    pub total_extension_days: i32,
    #[schema(value_type = Option<Object>)]
    pub courses: Option<Value>,
    pub status: BatchStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<batch::Model> for BatchResponse {
    fn from(model: batch::Model) -> Self {
        Self {
            id: model.id,
            external_id: model.external_id,
            disability_tags: model.tags(),
            name: model.name,
            start_date: model.start_date,
            approx_close_date: model.approx_close_date,
            total_extension_days: model.total_extension_days,
            courses: model.courses,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchExtensionResponse {
    pub external_id: Uuid,
    pub previous_close_date: NaiveDate,
    pub new_close_date: NaiveDate,
    pub extension_days: i32,
    pub reason: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<batch_extension::Model> for BatchExtensionResponse {
    fn from(model: batch_extension::Model) -> Self {
        Self {
            external_id: model.external_id,
            previous_close_date: model.previous_close_date,
            new_close_date: model.new_close_date,
            extension_days: model.extension_days,
            reason: model.reason,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchDetailResponse {
    pub batch: BatchResponse,
    pub extensions: Vec<BatchExtensionResponse>,
}

impl From<BatchDetails> for BatchDetailResponse {
    fn from(details: BatchDetails) -> Self {
        Self {
            batch: details.batch.into(),
            extensions: details.extensions.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchListResponse {
    pub items: Vec<BatchResponse>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}
