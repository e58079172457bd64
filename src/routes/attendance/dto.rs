use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entities::attendance::{self, AttendanceStatus};
use crate::services::attendance_service::AttendanceEntry;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceRecordRequest {
    pub batch_id: String,
    pub candidate_id: String,
    pub date: NaiveDate,
    /// Plan slot id; omit for a full-day record.
    pub period_id: Option<i64>,
    pub status: AttendanceStatus,
    pub remarks: Option<String>,
    pub trainer_notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkAttendanceRequest {
    pub records: Vec<AttendanceRecordRequest>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttendanceRangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CandidateAttendanceQuery {
    pub batch_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceResponse {
    pub id: i64,
    pub external_id: Uuid,
    pub batch_id: i64,
    pub candidate_id: i64,
    pub date: NaiveDate,
    pub period_id: Option<i64>,
    pub status: AttendanceStatus,
    pub remarks: Option<String>,
    pub trainer_notes: Option<String>,
    pub updated_at: NaiveDateTime,
}

impl From<attendance::Model> for AttendanceResponse {
    fn from(model: attendance::Model) -> Self {
        Self {
            id: model.id,
            external_id: model.external_id,
            batch_id: model.batch_id,
            candidate_id: model.candidate_id,
            date: model.date,
            period_id: model.period_id,
            status: model.status,
            remarks: model.remarks,
            trainer_notes: model.trainer_notes,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PeriodSummary {
    pub id: i64,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub activity_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceEntryResponse {
    pub record: AttendanceResponse,
    pub batch_external_id: Uuid,
    pub batch_name: String,
    pub period: Option<PeriodSummary>,
}

impl From<AttendanceEntry> for AttendanceEntryResponse {
    fn from(entry: AttendanceEntry) -> Self {
        Self {
            record: entry.record.into(),
            batch_external_id: entry.batch_external_id,
            batch_name: entry.batch_name,
            period: entry.period.map(|slot| PeriodSummary {
                id: slot.id,
                start_time: slot.start_time,
                end_time: slot.end_time,
                activity_name: slot.activity_name,
            }),
        }
    }
}
