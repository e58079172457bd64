use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::mock_interview::{self, InterviewStatus};
use crate::services::interview_service::InterviewUpdate;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateInterviewRequest {
    pub batch_id: String,
    pub candidate_id: String,
    pub interviewer: String,
    pub interview_date: NaiveDate,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub feedback: Option<String>,
    /// 0 to 10.
    pub rating: Option<i32>,
    pub status: Option<InterviewStatus>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateInterviewRequest {
    pub interviewer: Option<String>,
    pub interview_date: Option<NaiveDate>,
    pub questions: Option<Vec<String>>,
    pub skills: Option<Vec<String>>,
    pub feedback: Option<String>,
    pub rating: Option<i32>,
    pub status: Option<InterviewStatus>,
}

impl From<UpdateInterviewRequest> for InterviewUpdate {
    fn from(req: UpdateInterviewRequest) -> Self {
        InterviewUpdate {
            interviewer: req.interviewer,
            interview_date: req.interview_date,
            questions: req.questions,
            skills: req.skills,
            feedback: req.feedback,
            rating: req.rating,
            status: req.status,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InterviewResponse {
    pub id: i64,
    pub external_id: Uuid,
    pub batch_id: i64,
    pub candidate_id: i64,
    pub interviewer: String,
    pub interview_date: NaiveDate,
    pub questions: Vec<String>,
    pub skills: Vec<String>,
    pub feedback: Option<String>,
    pub rating: Option<i32>,
    pub status: InterviewStatus,
    pub updated_at: NaiveDateTime,
}

fn string_list(value: Option<serde_json::Value>) -> Vec<String> {
    value
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

impl From<mock_interview::Model> for InterviewResponse {
    fn from(model: mock_interview::Model) -> Self {
        Self {
            id: model.id,
            external_id: model.external_id,
            batch_id: model.batch_id,
            candidate_id: model.candidate_id,
            interviewer: model.interviewer,
            interview_date: model.interview_date,
            questions: string_list(model.questions),
            skills: string_list(model.skills),
            feedback: model.feedback,
            rating: model.rating,
            status: model.status,
            updated_at: model.updated_at,
        }
    }
}
