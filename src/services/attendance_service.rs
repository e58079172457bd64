use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::Serialize;
use uuid::Uuid;

use super::{TrainingError, TrainingResult, non_blank, require_batch, require_candidate};
use crate::audit::{Actor, AuditAction, AuditEntry, AuditSink};
use crate::entities::attendance::{self, AttendanceStatus, period_key};
use crate::entities::{batch, batch_plan};
use crate::repositories::{
    AllocationRepository, AttendanceRepository, BatchRef, CandidateRef, PlanRepository,
};

#[derive(Debug, Clone)]
pub struct AttendanceInput {
    pub batch: BatchRef,
    pub candidate: CandidateRef,
    pub date: NaiveDate,
    /// Plan slot id; `None` records the whole day.
    pub period_id: Option<i64>,
    pub status: AttendanceStatus,
    pub remarks: Option<String>,
    pub trainer_notes: Option<String>,
}

/// A stored attendance row with the batch and period it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceEntry {
    pub record: attendance::Model,
    pub batch_external_id: Uuid,
    pub batch_name: String,
    pub period: Option<batch_plan::Model>,
}

pub struct AttendanceService {
    db: DatabaseConnection,
    audit: Arc<dyn AuditSink>,
    attendance: AttendanceRepository,
    allocations: AllocationRepository,
    plans: PlanRepository,
}

impl AttendanceService {
    pub fn new(db: DatabaseConnection, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            db,
            audit,
            attendance: AttendanceRepository::new(),
            allocations: AllocationRepository::new(),
            plans: PlanRepository::new(),
        }
    }

    /// Writes every record or none of them. A record matching an existing
    /// (batch, candidate, date, period) overwrites it. Returns one entry per
    /// stored row.
    pub async fn bulk_upsert(
        &self,
        actor: &Actor,
        records: Vec<AttendanceInput>,
    ) -> TrainingResult<Vec<AttendanceEntry>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let txn = self.db.begin().await?;
        let mut batches: HashMap<BatchRef, batch::Model> = HashMap::new();
        let mut entries = Vec::with_capacity(records.len());
        let mut positions: HashMap<i64, usize> = HashMap::new();

        for input in records {
            let batch = match batches.get(&input.batch) {
                Some(batch) => batch.clone(),
                None => {
                    let batch = require_batch(&txn, input.batch).await?;
                    batches.insert(input.batch, batch.clone());
                    batch
                }
            };
            let candidate = require_candidate(&txn, input.candidate).await?;

            let allocation = self
                .allocations
                .find_pair(&txn, batch.id, candidate.id)
                .await?
                .ok_or_else(|| {
                    TrainingError::not_found(
                        "allocation",
                        format!("batch {} / candidate {}", batch.external_id, candidate.external_id),
                    )
                })?;
            if allocation.is_dropout {
                return Err(TrainingError::DropoutAttendanceBlocked {
                    batch: batch.external_id.to_string(),
                    candidate: candidate.external_id.to_string(),
                });
            }

            let period = match input.period_id {
                Some(period_id) => Some(
                    self.plans
                        .find_by_id(&txn, period_id)
                        .await?
                        .filter(|slot| slot.batch_id == batch.id)
                        .ok_or_else(|| TrainingError::not_found("period", period_id))?,
                ),
                None => None,
            };
            if let Some(slot) = period.as_ref().filter(|slot| slot.date != input.date) {
                return Err(TrainingError::InvalidInput(format!(
                    "period {} is scheduled on {}, not {}",
                    slot.id, slot.date, input.date
                )));
            }

            let key = period_key(input.period_id);
            let now = Utc::now().naive_utc();
            let model = attendance::ActiveModel {
                external_id: Set(Uuid::new_v4()),
                batch_id: Set(batch.id),
                candidate_id: Set(candidate.id),
                date: Set(input.date),
                period_id: Set(input.period_id),
                period_key: Set(key),
                status: Set(input.status),
                remarks: Set(non_blank(input.remarks)),
                trainer_notes: Set(non_blank(input.trainer_notes)),
                deleted_at: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };

            let record = self
                .attendance
                .upsert(&txn, model, batch.id, candidate.id, input.date, key)
                .await?;

            let entry = AttendanceEntry {
                record,
                batch_external_id: batch.external_id,
                batch_name: batch.name.clone(),
                period,
            };
            // A key repeated in one request keeps its first position and its last write.
            match positions.get(&entry.record.id) {
                Some(&at) => entries[at] = entry,
                None => {
                    positions.insert(entry.record.id, entries.len());
                    entries.push(entry);
                }
            }
        }

        txn.commit().await?;

        tracing::info!(records = entries.len(), "attendance upserted");
        for entry in &entries {
            self.audit.record(
                AuditEntry::new(actor, AuditAction::Update, "attendance", entry.record.external_id)
                    .after(&entry.record),
            );
        }
        Ok(entries)
    }

    pub async fn get_attendance(
        &self,
        batch_ref: BatchRef,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> TrainingResult<Vec<attendance::Model>> {
        if let (Some(from), Some(to)) = (from, to) {
            if to < from {
                return Err(TrainingError::InvalidInput(format!(
                    "date range end {to} is before start {from}"
                )));
            }
        }

        let txn = self.db.begin().await?;
        let batch = require_batch(&txn, batch_ref).await?;
        let records = self.attendance.list_by_batch(&txn, batch.id, from, to).await?;
        txn.commit().await?;
        Ok(records)
    }

    pub async fn get_by_candidate(
        &self,
        candidate_ref: CandidateRef,
        batch_ref: Option<BatchRef>,
    ) -> TrainingResult<Vec<attendance::Model>> {
        let txn = self.db.begin().await?;
        let candidate = require_candidate(&txn, candidate_ref).await?;
        let batch_id = match batch_ref {
            Some(batch_ref) => Some(require_batch(&txn, batch_ref).await?.id),
            None => None,
        };
        let records = self
            .attendance
            .list_by_candidate(&txn, candidate.id, batch_id)
            .await?;
        txn.commit().await?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;
    use crate::entities::candidate;
    use crate::services::allocation_service::{AllocationUpdate, NewAllocation};
    use crate::services::batch_service::NewBatch;
    use crate::services::schedule_service::NewPlanEntry;
    use crate::services::{AllocationService, BatchService, ScheduleService};
    use crate::test_support::{actor, date, memory_sink, seed_selected_candidate, setup_test_db};

    struct Fixture {
        db: DatabaseConnection,
        batch: batch::Model,
        candidate: candidate::Model,
        allocation_id: i64,
    }

    async fn fixture() -> Fixture {
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
        let candidate = seed_selected_candidate(&db, "Asha", None).await;
        let allocation = AllocationService::new(db.clone(), memory_sink())
            .allocate(
                &actor(),
                NewAllocation::new(BatchRef::Id(batch.id), CandidateRef::Id(candidate.id)),
            )
            .await
            .unwrap();
        Fixture {
            db,
            batch,
            candidate,
            allocation_id: allocation.id,
        }
    }

    fn mark(f: &Fixture, day: NaiveDate, period_id: Option<i64>, status: AttendanceStatus) -> AttendanceInput {
        AttendanceInput {
            batch: BatchRef::External(f.batch.external_id),
            candidate: CandidateRef::External(f.candidate.external_id),
            date: day,
            period_id,
            status,
            remarks: None,
            trainer_notes: None,
        }
    }

    #[tokio::test]
    async fn upsert_overwrites_by_natural_key() {
        let f = fixture().await;
        let service = AttendanceService::new(f.db.clone(), memory_sink());
        let day = date(2025, 1, 7);

        let first = service
            .bulk_upsert(&actor(), vec![mark(&f, day, None, AttendanceStatus::Present)])
            .await
            .unwrap();
        let mut late = mark(&f, day, None, AttendanceStatus::Late);
        late.remarks = Some("bus delay".to_string());
        let second = service.bulk_upsert(&actor(), vec![late]).await.unwrap();

        assert_eq!(first[0].record.id, second[0].record.id);
        assert_eq!(first[0].record.external_id, second[0].record.external_id);
        assert_eq!(second[0].record.status, AttendanceStatus::Late);
        assert_eq!(second[0].record.remarks.as_deref(), Some("bus delay"));
        assert_eq!(second[0].batch_name, "B1");

        let rows = service
            .get_attendance(BatchRef::Id(f.batch.id), None, None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn periods_are_separate_keys() {
        let f = fixture().await;
        let slot = excel_slot(&f, date(2025, 1, 7)).await;
        let service = AttendanceService::new(f.db.clone(), memory_sink());
        let day = date(2025, 1, 7);

        let entries = service
            .bulk_upsert(
                &actor(),
                vec![
                    mark(&f, day, None, AttendanceStatus::Present),
                    mark(&f, day, Some(slot.id), AttendanceStatus::Absent),
                ],
            )
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].period.as_ref().map(|p| p.id), Some(slot.id));

        let rows = service
            .get_by_candidate(CandidateRef::Id(f.candidate.id), None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    async fn excel_slot(f: &Fixture, day: NaiveDate) -> batch_plan::Model {
        ScheduleService::new(f.db.clone(), memory_sink())
            .create_plan_entry(
                &actor(),
                NewPlanEntry {
                    batch: BatchRef::Id(f.batch.id),
                    date: day,
                    start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                    end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                    activity_type: "course".to_string(),
                    activity_name: "Excel".to_string(),
                    trainer: None,
                    notes: None,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn period_must_fall_on_the_attendance_date() {
        let f = fixture().await;
        let slot = excel_slot(&f, date(2025, 1, 7)).await;
        let service = AttendanceService::new(f.db.clone(), memory_sink());

        let err = service
            .bulk_upsert(
                &actor(),
                vec![mark(&f, date(2025, 1, 8), Some(slot.id), AttendanceStatus::Present)],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TrainingError::InvalidInput(_)));

        let rows = service
            .get_attendance(BatchRef::Id(f.batch.id), None, None)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn repeated_key_in_one_request_returns_the_final_row() {
        let f = fixture().await;
        let service = AttendanceService::new(f.db.clone(), memory_sink());
        let day = date(2025, 1, 7);
        let other_day = date(2025, 1, 8);

        let entries = service
            .bulk_upsert(
                &actor(),
                vec![
                    mark(&f, day, None, AttendanceStatus::Present),
                    mark(&f, other_day, None, AttendanceStatus::Present),
                    mark(&f, day, None, AttendanceStatus::Absent),
                ],
            )
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].record.date, day);
        assert_eq!(entries[0].record.status, AttendanceStatus::Absent);
        assert_eq!(entries[1].record.date, other_day);
    }

    #[tokio::test]
    async fn unknown_period_is_not_found() {
        let f = fixture().await;
        let service = AttendanceService::new(f.db.clone(), memory_sink());

        let err = service
            .bulk_upsert(
                &actor(),
                vec![mark(&f, date(2025, 1, 7), Some(4_242), AttendanceStatus::Present)],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TrainingError::NotFound { entity: "period", .. }));
    }

    #[tokio::test]
    async fn dropouts_are_blocked_and_nothing_is_written() {
        let f = fixture().await;
        AllocationService::new(f.db.clone(), memory_sink())
            .update(
                &actor(),
                f.allocation_id,
                AllocationUpdate {
                    is_dropout: Some(true),
                    dropout_remark: Some("moved away".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let other = seed_selected_candidate(&f.db, "Ravi", None).await;
        AllocationService::new(f.db.clone(), memory_sink())
            .allocate(
                &actor(),
                NewAllocation::new(BatchRef::Id(f.batch.id), CandidateRef::Id(other.id)),
            )
            .await
            .unwrap();

        let service = AttendanceService::new(f.db.clone(), memory_sink());
        let ok_row = AttendanceInput {
            candidate: CandidateRef::Id(other.id),
            ..mark(&f, date(2025, 1, 7), None, AttendanceStatus::Present)
        };
        let err = service
            .bulk_upsert(
                &actor(),
                vec![ok_row, mark(&f, date(2025, 1, 7), None, AttendanceStatus::Present)],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TrainingError::DropoutAttendanceBlocked { .. }));

        let rows = service
            .get_attendance(BatchRef::Id(f.batch.id), None, None)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn unallocated_candidate_is_not_found() {
        let f = fixture().await;
        let stranger = seed_selected_candidate(&f.db, "Stranger", None).await;
        let service = AttendanceService::new(f.db.clone(), memory_sink());

        let err = service
            .bulk_upsert(
                &actor(),
                vec![AttendanceInput {
                    candidate: CandidateRef::Id(stranger.id),
                    ..mark(&f, date(2025, 1, 7), None, AttendanceStatus::Present)
                }],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TrainingError::NotFound { entity: "allocation", .. }));
    }

    #[tokio::test]
    async fn date_range_filters_rows() {
        let f = fixture().await;
        let service = AttendanceService::new(f.db.clone(), memory_sink());
        service
            .bulk_upsert(
                &actor(),
                (6..=10)
                    .map(|d| mark(&f, date(2025, 1, d), None, AttendanceStatus::Present))
                    .collect(),
            )
            .await
            .unwrap();

        let rows = service
            .get_attendance(BatchRef::Id(f.batch.id), Some(date(2025, 1, 7)), Some(date(2025, 1, 9)))
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);

        let err = service
            .get_attendance(BatchRef::Id(f.batch.id), Some(date(2025, 1, 9)), Some(date(2025, 1, 7)))
            .await
            .unwrap_err();
        assert!(matches!(err, TrainingError::InvalidInput(_)));

        assert!(service.bulk_upsert(&actor(), vec![]).await.unwrap().is_empty());
    }
}
