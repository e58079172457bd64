use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::scored_record::{self, RecordKind};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScoredRecordRequest {
    pub batch_id: String,
    pub candidate_id: String,
    #[schema(example = "Midterm")]
    pub name: String,
    pub trainer_id: Option<Uuid>,
    /// Ignored when `course_marks` is given.
    pub marks_obtained: Option<f64>,
    /// Defaults to 100.
    pub max_marks: Option<f64>,
    pub date: NaiveDate,
    pub submission_date: Option<NaiveDate>,
    #[schema(example = json!({"Excel": 40.0, "Word": 35.0}))]
    pub course_marks: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkScoredRecordRequest {
    pub records: Vec<ScoredRecordRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScoredRecordResponse {
    pub id: i64,
    pub external_id: Uuid,
    pub kind: RecordKind,
    pub batch_id: i64,
    pub candidate_id: i64,
    pub name: String,
    pub trainer_id: Option<Uuid>,
    pub marks_obtained: f64,
    pub max_marks: f64,
    pub date: NaiveDate,
    pub submission_date: Option<NaiveDate>,
    #[schema(value_type = Option<Object>)]
    pub course_marks: Option<Value>,
    pub updated_at: NaiveDateTime,
}

impl From<scored_record::Model> for ScoredRecordResponse {
    fn from(model: scored_record::Model) -> Self {
        Self {
            id: model.id,
            external_id: model.external_id,
            kind: model.kind,
            batch_id: model.batch_id,
            candidate_id: model.candidate_id,
            name: model.name,
            trainer_id: model.trainer_id,
            marks_obtained: model.marks_obtained,
            max_marks: model.max_marks,
            date: model.record_date,
            submission_date: model.submission_date,
            course_marks: model.course_marks,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteByNameResponse {
    pub deleted: u64,
}
