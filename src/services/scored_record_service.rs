use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::{ConnectionTrait, DatabaseConnection, Set, TransactionTrait};
use serde_json::Value;
use uuid::Uuid;

use super::error::is_unique_violation;
use super::{TrainingError, TrainingResult, require_batch, require_candidate};
use crate::audit::{Actor, AuditAction, AuditEntry, AuditSink};
use crate::config::DEFAULT_MAX_MARKS;
use crate::entities::scored_record::{self, RecordKind};
use crate::repositories::{BatchRef, CandidateRef, ScoredRecordRepository};

#[derive(Debug, Clone)]
pub struct ScoredRecordInput {
    pub batch: BatchRef,
    pub candidate: CandidateRef,
    pub name: String,
    pub trainer_id: Option<Uuid>,
    pub marks_obtained: Option<f64>,
    pub max_marks: Option<f64>,
    pub record_date: NaiveDate,
    pub submission_date: Option<NaiveDate>,
    /// Per sub-course marks. When present the total is their sum.
    pub course_marks: Option<BTreeMap<String, f64>>,
}

/// Validated record ready to be written.
struct Prepared {
    batch_id: i64,
    batch_external_id: Uuid,
    candidate_id: i64,
    candidate_external_id: Uuid,
    name: String,
    model: scored_record::ActiveModel,
}

pub struct ScoredRecordService {
    db: DatabaseConnection,
    audit: Arc<dyn AuditSink>,
    records: ScoredRecordRepository,
}

impl ScoredRecordService {
    pub fn new(db: DatabaseConnection, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            db,
            audit,
            records: ScoredRecordRepository::new(),
        }
    }

    /// Inserts a new record; an existing (kind, batch, candidate, name) is a conflict.
    pub async fn create(
        &self,
        actor: &Actor,
        kind: RecordKind,
        input: ScoredRecordInput,
    ) -> TrainingResult<scored_record::Model> {
        let txn = self.db.begin().await?;
        let prepared = prepare(&txn, kind, input).await?;

        let duplicate = || TrainingError::DuplicateRecord {
            kind: kind.as_str(),
            name: prepared.name.clone(),
            batch: prepared.batch_external_id.to_string(),
            candidate: prepared.candidate_external_id.to_string(),
        };

        let existing = self
            .records
            .find_any_by_natural_key(&txn, kind, prepared.batch_id, prepared.candidate_id, &prepared.name)
            .await?;

        let record = match existing {
            Some(live) if live.deleted_at.is_none() => return Err(duplicate()),
            // A soft-deleted row still owns the key; bring it back.
            Some(_) => {
                self.records
                    .upsert(
                        &txn,
                        prepared.model.clone(),
                        kind,
                        prepared.batch_id,
                        prepared.candidate_id,
                        &prepared.name,
                    )
                    .await?
            }
            None => self
                .records
                .insert(&txn, prepared.model.clone())
                .await
                .map_err(|err| {
                    if is_unique_violation(&err) {
                        duplicate()
                    } else {
                        err.into()
                    }
                })?,
        };
        txn.commit().await?;

        self.audit.record(
            AuditEntry::new(actor, AuditAction::Create, kind.as_str(), record.external_id)
                .after(&record),
        );
        Ok(record)
    }

    /// Creates or overwrites each record by natural key, all in one transaction.
    pub async fn bulk_upsert(
        &self,
        actor: &Actor,
        kind: RecordKind,
        inputs: Vec<ScoredRecordInput>,
    ) -> TrainingResult<Vec<scored_record::Model>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let txn = self.db.begin().await?;
        let mut saved = Vec::with_capacity(inputs.len());
        for input in inputs {
            let prepared = prepare(&txn, kind, input).await?;
            let record = self
                .records
                .upsert(
                    &txn,
                    prepared.model,
                    kind,
                    prepared.batch_id,
                    prepared.candidate_id,
                    &prepared.name,
                )
                .await?;
            saved.push(record);
        }
        txn.commit().await?;

        tracing::info!(kind = kind.as_str(), records = saved.len(), "scored records upserted");
        for record in &saved {
            self.audit.record(
                AuditEntry::new(actor, AuditAction::Update, kind.as_str(), record.external_id)
                    .after(record),
            );
        }
        Ok(saved)
    }

    pub async fn get_by_batch(
        &self,
        kind: RecordKind,
        batch_ref: BatchRef,
    ) -> TrainingResult<Vec<scored_record::Model>> {
        let txn = self.db.begin().await?;
        let batch = require_batch(&txn, batch_ref).await?;
        let records = self.records.list_by_batch(&txn, kind, batch.id).await?;
        txn.commit().await?;
        Ok(records)
    }

    /// Soft-deletes every record with this name in the batch and returns how many.
    pub async fn delete_by_name(
        &self,
        actor: &Actor,
        kind: RecordKind,
        batch_ref: BatchRef,
        name: &str,
    ) -> TrainingResult<u64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TrainingError::InvalidInput("name is required".to_string()));
        }

        let txn = self.db.begin().await?;
        let batch = require_batch(&txn, batch_ref).await?;
        let deleted = self
            .records
            .soft_delete_by_name(&txn, kind, batch.id, name)
            .await?;
        txn.commit().await?;

        tracing::info!(kind = kind.as_str(), batch_id = batch.id, name, deleted, "scored records deleted");
        if deleted > 0 {
            self.audit.record(
                AuditEntry::new(
                    actor,
                    AuditAction::Delete,
                    kind.as_str(),
                    format!("{}/{}", batch.external_id, name),
                )
                .after(&serde_json::json!({ "deleted": deleted })),
            );
        }
        Ok(deleted)
    }
}

async fn prepare<C: ConnectionTrait>(
    db: &C,
    kind: RecordKind,
    input: ScoredRecordInput,
) -> TrainingResult<Prepared> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(TrainingError::InvalidInput("name is required".to_string()));
    }

    let marks_obtained = derive_marks(input.marks_obtained, input.course_marks.as_ref())?;
    let max_marks = input.max_marks.unwrap_or(DEFAULT_MAX_MARKS);
    if !max_marks.is_finite() || max_marks <= 0.0 {
        return Err(TrainingError::InvalidInput(format!(
            "max_marks must be positive, got {max_marks}"
        )));
    }

    let batch = require_batch(db, input.batch).await?;
    let candidate = require_candidate(db, input.candidate).await?;

    let course_marks = input.course_marks.filter(|m| !m.is_empty()).map(|marks| {
        Value::Object(
            marks
                .into_iter()
                .map(|(course, value)| (course, Value::from(value)))
                .collect(),
        )
    });

    let now = Utc::now().naive_utc();
    let model = scored_record::ActiveModel {
        external_id: Set(Uuid::new_v4()),
        kind: Set(kind),
        batch_id: Set(batch.id),
        candidate_id: Set(candidate.id),
        name: Set(name.clone()),
        trainer_id: Set(input.trainer_id),
        marks_obtained: Set(marks_obtained),
        max_marks: Set(max_marks),
        record_date: Set(input.record_date),
        submission_date: Set(input.submission_date),
        course_marks: Set(course_marks),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    Ok(Prepared {
        batch_id: batch.id,
        batch_external_id: batch.external_id,
        candidate_id: candidate.id,
        candidate_external_id: candidate.external_id,
        name,
        model,
    })
}

/// The breakdown wins over a supplied total.
fn derive_marks(
    marks_obtained: Option<f64>,
    course_marks: Option<&BTreeMap<String, f64>>,
) -> TrainingResult<f64> {
    let marks = match course_marks.filter(|m| !m.is_empty()) {
        Some(breakdown) => {
            if let Some((course, value)) = breakdown
                .iter()
                .find(|(_, value)| !value.is_finite() || **value < 0.0)
            {
                return Err(TrainingError::InvalidInput(format!(
                    "marks for {course} must be a non-negative number, got {value}"
                )));
            }
            breakdown.values().sum()
        }
        None => marks_obtained.ok_or_else(|| {
            TrainingError::InvalidInput("marks_obtained or course_marks is required".to_string())
        })?,
    };

    if !marks.is_finite() || marks < 0.0 {
        return Err(TrainingError::InvalidInput(format!(
            "marks_obtained must be a non-negative number, got {marks}"
        )));
    }
    Ok(marks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{batch, candidate};
    use crate::services::BatchService;
    use crate::services::batch_service::NewBatch;
    use crate::test_support::{actor, date, memory_sink, seed_candidate, setup_test_db};

    async fn setup() -> (DatabaseConnection, batch::Model, candidate::Model, candidate::Model) {
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
        let asha = seed_candidate(&db, "Asha", None).await;
        let ravi = seed_candidate(&db, "Ravi", None).await;
        (db, batch, asha, ravi)
    }

    fn input(batch: &batch::Model, candidate_id: i64, name: &str) -> ScoredRecordInput {
        ScoredRecordInput {
            batch: BatchRef::Id(batch.id),
            candidate: CandidateRef::Id(candidate_id),
            name: name.to_string(),
            trainer_id: None,
            marks_obtained: Some(60.0),
            max_marks: None,
            record_date: date(2025, 2, 1),
            submission_date: None,
            course_marks: None,
        }
    }

    #[test]
    fn breakdown_sum_replaces_total() {
        let breakdown = BTreeMap::from([("Excel".to_string(), 40.0), ("Word".to_string(), 35.0)]);
        assert_eq!(derive_marks(Some(10.0), Some(&breakdown)).unwrap(), 75.0);
        assert_eq!(derive_marks(Some(10.0), Some(&BTreeMap::new())).unwrap(), 10.0);
        assert!(derive_marks(None, None).is_err());

        let negative = BTreeMap::from([("Excel".to_string(), -1.0)]);
        assert!(derive_marks(None, Some(&negative)).is_err());
    }

    #[tokio::test]
    async fn create_defaults_and_rejects_duplicates() {
        let (db, batch, asha, _) = setup().await;
        let service = ScoredRecordService::new(db, memory_sink());

        let mut first = input(&batch, asha.id, "Midterm");
        first.course_marks = Some(BTreeMap::from([
            ("Excel".to_string(), 40.0),
            ("Word".to_string(), 35.0),
        ]));
        let record = service
            .create(&actor(), RecordKind::Assessment, first)
            .await
            .unwrap();
        assert_eq!(record.marks_obtained, 75.0);
        assert_eq!(record.max_marks, 100.0);
        assert_eq!(record.course_marks.as_ref().unwrap()["Excel"], 40.0);

        let err = service
            .create(&actor(), RecordKind::Assessment, input(&batch, asha.id, "Midterm"))
            .await
            .unwrap_err();
        assert!(matches!(err, TrainingError::DuplicateRecord { .. }));

        service
            .create(&actor(), RecordKind::Assignment, input(&batch, asha.id, "Midterm"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn bulk_upsert_overwrites_by_natural_key() {
        let (db, batch, asha, ravi) = setup().await;
        let service = ScoredRecordService::new(db, memory_sink());

        let first = service
            .bulk_upsert(
                &actor(),
                RecordKind::Assessment,
                vec![input(&batch, asha.id, "Quiz 1"), input(&batch, ravi.id, "Quiz 1")],
            )
            .await
            .unwrap();
        assert_eq!(first.len(), 2);

        let mut regrade = input(&batch, asha.id, "Quiz 1");
        regrade.marks_obtained = Some(88.5);
        regrade.max_marks = Some(90.0);
        let second = service
            .bulk_upsert(&actor(), RecordKind::Assessment, vec![regrade])
            .await
            .unwrap();
        assert_eq!(second[0].id, first[0].id);
        assert_eq!(second[0].marks_obtained, 88.5);
        assert_eq!(second[0].max_marks, 90.0);

        let all = service
            .get_by_batch(RecordKind::Assessment, BatchRef::Id(batch.id))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert!(
            service
                .get_by_batch(RecordKind::Assignment, BatchRef::Id(batch.id))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn delete_by_name_counts_and_allows_recreation() {
        let (db, batch, asha, ravi) = setup().await;
        let service = ScoredRecordService::new(db, memory_sink());
        service
            .bulk_upsert(
                &actor(),
                RecordKind::Assignment,
                vec![
                    input(&batch, asha.id, "Essay"),
                    input(&batch, ravi.id, "Essay"),
                    input(&batch, asha.id, "Poster"),
                ],
            )
            .await
            .unwrap();

        let deleted = service
            .delete_by_name(&actor(), RecordKind::Assignment, BatchRef::Id(batch.id), "Essay")
            .await
            .unwrap();
        assert_eq!(deleted, 2);

        let again = service
            .delete_by_name(&actor(), RecordKind::Assignment, BatchRef::Id(batch.id), "Essay")
            .await
            .unwrap();
        assert_eq!(again, 0);

        let revived = service
            .bulk_upsert(&actor(), RecordKind::Assignment, vec![input(&batch, asha.id, "Essay")])
            .await
            .unwrap();
        assert_eq!(revived.len(), 1);

        service
            .delete_by_name(&actor(), RecordKind::Assignment, BatchRef::Id(batch.id), "Poster")
            .await
            .unwrap();
        service
            .create(&actor(), RecordKind::Assignment, input(&batch, asha.id, "Poster"))
            .await
            .unwrap();

        let remaining = service
            .get_by_batch(RecordKind::Assignment, BatchRef::Id(batch.id))
            .await
            .unwrap();
        assert_eq!(remaining.len(), 2);
    }

    #[tokio::test]
    async fn unknown_candidate_is_not_found() {
        let (db, batch, _, _) = setup().await;
        let service = ScoredRecordService::new(db, memory_sink());
        let missing = input(&batch, 9_999, "Quiz");

        let err = service
            .create(&actor(), RecordKind::Assessment, missing)
            .await
            .unwrap_err();
        assert!(matches!(err, TrainingError::NotFound { entity: "candidate", .. }));
    }
}
