use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::{DatabaseConnection, IntoActiveModel, Set, TransactionTrait};
use serde_json::Value;
use uuid::Uuid;

use super::{TrainingError, TrainingResult, non_blank, require_batch, require_candidate};
use crate::audit::{Actor, AuditAction, AuditEntry, AuditSink};
use crate::entities::mock_interview::{self, InterviewStatus};
use crate::repositories::{BatchRef, CandidateRef, InterviewRepository};

pub const MAX_RATING: i32 = 10;

#[derive(Debug, Clone)]
pub struct NewInterview {
    pub batch: BatchRef,
    pub candidate: CandidateRef,
    pub interviewer: String,
    pub interview_date: NaiveDate,
    pub questions: Vec<String>,
    pub skills: Vec<String>,
    pub feedback: Option<String>,
    pub rating: Option<i32>,
    pub status: Option<InterviewStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct InterviewUpdate {
    pub interviewer: Option<String>,
    pub interview_date: Option<NaiveDate>,
    pub questions: Option<Vec<String>>,
    pub skills: Option<Vec<String>>,
    pub feedback: Option<String>,
    pub rating: Option<i32>,
    pub status: Option<InterviewStatus>,
}

pub struct InterviewService {
    db: DatabaseConnection,
    audit: Arc<dyn AuditSink>,
    interviews: InterviewRepository,
}

impl InterviewService {
    pub fn new(db: DatabaseConnection, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            db,
            audit,
            interviews: InterviewRepository::new(),
        }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        input: NewInterview,
    ) -> TrainingResult<mock_interview::Model> {
        let interviewer = non_blank(Some(input.interviewer))
            .ok_or_else(|| TrainingError::InvalidInput("interviewer is required".to_string()))?;
        check_rating(input.rating)?;

        let txn = self.db.begin().await?;
        let batch = require_batch(&txn, input.batch).await?;
        let candidate = require_candidate(&txn, input.candidate).await?;

        let now = Utc::now().naive_utc();
        let interview = self
            .interviews
            .insert(
                &txn,
                mock_interview::ActiveModel {
                    external_id: Set(Uuid::new_v4()),
                    batch_id: Set(batch.id),
                    candidate_id: Set(candidate.id),
                    interviewer: Set(interviewer),
                    interview_date: Set(input.interview_date),
                    questions: Set(Some(string_list(input.questions))),
                    skills: Set(Some(string_list(input.skills))),
                    feedback: Set(non_blank(input.feedback)),
                    rating: Set(input.rating),
                    status: Set(input.status.unwrap_or(InterviewStatus::Pending)),
                    deleted_at: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                },
            )
            .await?;
        txn.commit().await?;

        self.audit.record(
            AuditEntry::new(actor, AuditAction::Create, "mock_interview", interview.external_id)
                .after(&interview),
        );
        Ok(interview)
    }

    pub async fn get(&self, interview_id: i64) -> TrainingResult<mock_interview::Model> {
        self.interviews
            .find_by_id(&self.db, interview_id)
            .await?
            .ok_or_else(|| TrainingError::not_found("interview", interview_id))
    }

    pub async fn get_by_batch(&self, batch_ref: BatchRef) -> TrainingResult<Vec<mock_interview::Model>> {
        let txn = self.db.begin().await?;
        let batch = require_batch(&txn, batch_ref).await?;
        let interviews = self.interviews.list_by_batch(&txn, batch.id).await?;
        txn.commit().await?;
        Ok(interviews)
    }

    pub async fn get_by_candidate(
        &self,
        candidate_ref: CandidateRef,
    ) -> TrainingResult<Vec<mock_interview::Model>> {
        let txn = self.db.begin().await?;
        let candidate = require_candidate(&txn, candidate_ref).await?;
        let interviews = self.interviews.list_by_candidate(&txn, candidate.id).await?;
        txn.commit().await?;
        Ok(interviews)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        interview_id: i64,
        changes: InterviewUpdate,
    ) -> TrainingResult<mock_interview::Model> {
        check_rating(changes.rating)?;

        let txn = self.db.begin().await?;
        let before = self
            .interviews
            .find_by_id(&txn, interview_id)
            .await?
            .ok_or_else(|| TrainingError::not_found("interview", interview_id))?;

        let mut model = before.clone().into_active_model();
        if let Some(interviewer) = changes.interviewer {
            let interviewer = non_blank(Some(interviewer))
                .ok_or_else(|| TrainingError::InvalidInput("interviewer is required".to_string()))?;
            model.interviewer = Set(interviewer);
        }
        if let Some(date) = changes.interview_date {
            model.interview_date = Set(date);
        }
        if let Some(questions) = changes.questions {
            model.questions = Set(Some(string_list(questions)));
        }
        if let Some(skills) = changes.skills {
            model.skills = Set(Some(string_list(skills)));
        }
        if let Some(feedback) = changes.feedback {
            model.feedback = Set(non_blank(Some(feedback)));
        }
        if let Some(rating) = changes.rating {
            model.rating = Set(Some(rating));
        }
        if let Some(status) = changes.status {
            model.status = Set(status);
        }
        model.updated_at = Set(Utc::now().naive_utc());

        let after = self.interviews.update(&txn, model).await?;
        txn.commit().await?;

        self.audit.record(
            AuditEntry::new(actor, AuditAction::Update, "mock_interview", after.external_id)
                .before(&before)
                .after(&after),
        );
        Ok(after)
    }

    pub async fn delete(&self, actor: &Actor, interview_id: i64) -> TrainingResult<()> {
        let txn = self.db.begin().await?;
        let before = self
            .interviews
            .find_by_id(&txn, interview_id)
            .await?
            .ok_or_else(|| TrainingError::not_found("interview", interview_id))?;
        self.interviews.soft_delete(&txn, before.id).await?;
        txn.commit().await?;

        self.audit.record(
            AuditEntry::new(actor, AuditAction::Delete, "mock_interview", before.external_id)
                .before(&before),
        );
        Ok(())
    }
}

fn check_rating(rating: Option<i32>) -> TrainingResult<()> {
    match rating {
        Some(r) if !(0..=MAX_RATING).contains(&r) => Err(TrainingError::InvalidInput(format!(
            "rating must be between 0 and {MAX_RATING}, got {r}"
        ))),
        _ => Ok(()),
    }
}

fn string_list(items: Vec<String>) -> Value {
    Value::Array(
        items
            .into_iter()
            .filter_map(|item| non_blank(Some(item)))
            .map(Value::String)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::BatchService;
    use crate::services::batch_service::NewBatch;
    use crate::test_support::{actor, date, memory_sink, seed_candidate, setup_test_db};

    #[tokio::test]
    async fn interview_lifecycle() {
        let db = setup_test_db().await;
        let batch = BatchService::new(db.clone(), memory_sink())
            .create(
                &actor(),
                NewBatch {
                    name: "B1".to_string(),
                    disability_tags: vec![],
                    start_date: date(2025, 1, 6),
                    approx_close_date: date(2025, 3, 28),
                    courses: None,
                    status: None,
                },
            )
            .await
            .unwrap();
        let candidate = seed_candidate(&db, "Asha", Some("visual")).await;
        let sink = memory_sink();
        let service = InterviewService::new(db.clone(), sink.clone());

        let interview = service
            .create(
                &actor(),
                NewInterview {
                    batch: BatchRef::Id(batch.id),
                    candidate: CandidateRef::External(candidate.external_id),
                    interviewer: "Meera".to_string(),
                    interview_date: date(2025, 3, 1),
                    questions: vec!["Tell us about yourself".to_string(), " ".to_string()],
                    skills: vec!["communication".to_string()],
                    feedback: None,
                    rating: None,
                    status: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(interview.status, InterviewStatus::Pending);
        assert_eq!(interview.questions, Some(serde_json::json!(["Tell us about yourself"])));

        let updated = service
            .update(
                &actor(),
                interview.id,
                InterviewUpdate {
                    status: Some(InterviewStatus::ReTest),
                    rating: Some(6),
                    feedback: Some("Needs more practice".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, InterviewStatus::ReTest);
        assert_eq!(updated.interviewer, "Meera");

        assert_eq!(service.get_by_batch(BatchRef::Id(batch.id)).await.unwrap().len(), 1);
        assert_eq!(
            service
                .get_by_candidate(CandidateRef::Id(candidate.id))
                .await
                .unwrap()
                .len(),
            1
        );

        service.delete(&actor(), interview.id).await.unwrap();
        let err = service.get(interview.id).await.unwrap_err();
        assert!(matches!(err, TrainingError::NotFound { entity: "interview", .. }));
        assert!(service.get_by_batch(BatchRef::Id(batch.id)).await.unwrap().is_empty());
        assert_eq!(sink.entries().len(), 3);
    }

    #[tokio::test]
    async fn requires_existing_batch_and_valid_rating() {
        let db = setup_test_db().await;
        let candidate = seed_candidate(&db, "Asha", None).await;
        let service = InterviewService::new(db, memory_sink());
        let new = |rating| NewInterview {
            batch: BatchRef::Id(77),
            candidate: CandidateRef::Id(candidate.id),
            interviewer: "Meera".to_string(),
            interview_date: date(2025, 3, 1),
            questions: vec![],
            skills: vec![],
            feedback: None,
            rating,
            status: None,
        };

        let err = service.create(&actor(), new(Some(11))).await.unwrap_err();
        assert!(matches!(err, TrainingError::InvalidInput(_)));

        let err = service.create(&actor(), new(Some(5))).await.unwrap_err();
        assert!(matches!(err, TrainingError::NotFound { entity: "batch", .. }));
    }
}
