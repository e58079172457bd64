use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entities::batch_event::{self, EventType};
use crate::entities::batch_plan;
use crate::services::schedule_service::PlanEntryUpdate;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePlanEntryRequest {
    pub batch_id: String,
    pub date: NaiveDate,
    #[schema(value_type = String, example = "09:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "11:00:00")]
    pub end_time: NaiveTime,
    #[schema(example = "course")]
    pub activity_type: String,
    #[schema(example = "MS Excel")]
    pub activity_name: String,
    pub trainer: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePlanEntryRequest {
    pub date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub start_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub end_time: Option<NaiveTime>,
    pub activity_type: Option<String>,
    pub activity_name: Option<String>,
    pub trainer: Option<String>,
    pub notes: Option<String>,
}

impl From<UpdatePlanEntryRequest> for PlanEntryUpdate {
    fn from(req: UpdatePlanEntryRequest) -> Self {
        PlanEntryUpdate {
            date: req.date,
            start_time: req.start_time,
            end_time: req.end_time,
            activity_type: req.activity_type,
            activity_name: req.activity_name,
            trainer: req.trainer,
            notes: req.notes,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WeeklyPlanQuery {
    /// First day of the seven-day window.
    pub start_date: NaiveDate,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlanEntryResponse {
    pub id: i64,
    pub external_id: Uuid,
    pub batch_id: i64,
    pub date: NaiveDate,
    #[schema(value_type = String)]
    pub start_time: NaiveTime,
    #[schema(value_type = String)]
    pub end_time: NaiveTime,
    pub duration_minutes: i64,
    pub activity_type: String,
    pub activity_name: String,
    pub trainer: Option<String>,
    pub notes: Option<String>,
    pub updated_at: NaiveDateTime,
}

impl From<batch_plan::Model> for PlanEntryResponse {
    fn from(model: batch_plan::Model) -> Self {
        Self {
            duration_minutes: model.duration_minutes(),
            id: model.id,
            external_id: model.external_id,
            batch_id: model.batch_id,
            date: model.date,
            start_time: model.start_time,
            end_time: model.end_time,
            activity_type: model.activity_type,
            activity_name: model.activity_name,
            trainer: model.trainer,
            notes: model.notes,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    pub batch_id: String,
    pub date: NaiveDate,
    pub event_type: EventType,
    #[schema(example = "Republic Day")]
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EventResponse {
    pub id: i64,
    pub external_id: Uuid,
    pub batch_id: i64,
    pub date: NaiveDate,
    pub event_type: EventType,
    pub title: String,
    pub description: Option<String>,
}

impl From<batch_event::Model> for EventResponse {
    fn from(model: batch_event::Model) -> Self {
        Self {
            id: model.id,
            external_id: model.external_id,
            batch_id: model.batch_id,
            date: model.date,
            event_type: model.event_type,
            title: model.title,
            description: model.description,
        }
    }
}
