//! Marks the retained candidates of closed batches as completed.
//!
//! Batches closed before completion tracking existed still carry `allocated`
//! rows. Running the backfill again is a no-op.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{DatabaseConnection, IntoActiveModel, Set, TransactionTrait};
use serde::Serialize;
use utoipa::ToSchema;

use super::TrainingResult;
use super::allocation_service::{apply_state, completed_now, history_json};
use crate::audit::{Actor, AuditAction, AuditEntry, AuditSink};
use crate::entities::allocation::{AllocationStatus, StatusTransition};
use crate::entities::batch::BatchStatus;
use crate::repositories::{AllocationRepository, BatchRepository};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct BackfillReport {
    pub batches_processed: u64,
    pub allocations_updated: u64,
}

pub struct CompletionBackfill {
    db: DatabaseConnection,
    audit: Arc<dyn AuditSink>,
    batches: BatchRepository,
    allocations: AllocationRepository,
}

impl CompletionBackfill {
    pub fn new(db: DatabaseConnection, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            db,
            audit,
            batches: BatchRepository::new(),
            allocations: AllocationRepository::new(),
        }
    }

    pub async fn fix_closed_batch_allocations(&self, actor: &Actor) -> TrainingResult<BackfillReport> {
        let mut report = BackfillReport::default();
        let closed = self.batches.find_by_status(&self.db, BatchStatus::Closed).await?;

        for batch in closed {
            let txn = self.db.begin().await?;
            let mut updated = Vec::new();

            for allocation in self.allocations.list_retained(&txn, batch.id).await? {
                if allocation.status == AllocationStatus::Completed {
                    continue;
                }

                let state = completed_now(true);
                let mut history = allocation.history();
                history.push(StatusTransition {
                    from: Some(allocation.status),
                    to: AllocationStatus::Completed,
                    at: Utc::now().naive_utc(),
                    note: Some("completion backfill".to_string()),
                });

                let mut model = allocation.clone().into_active_model();
                apply_state(&mut model, &state, allocation.candidate_id, false);
                model.status_history = Set(history_json(&history));
                model.updated_at = Set(Utc::now().naive_utc());

                let after = self.allocations.update(&txn, model).await?;
                updated.push((allocation, after));
            }

            txn.commit().await?;
            report.batches_processed += 1;
            report.allocations_updated += updated.len() as u64;

            if !updated.is_empty() {
                tracing::info!(
                    batch_id = batch.id,
                    allocations_updated = updated.len(),
                    "closed batch allocations completed"
                );
            }
            for (before, after) in updated {
                self.audit.record(
                    AuditEntry::new(actor, AuditAction::Update, "allocation", after.external_id)
                        .before(&before)
                        .after(&after),
                );
            }
        }

        tracing::info!(
            batches_processed = report.batches_processed,
            allocations_updated = report.allocations_updated,
            "completion backfill finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::allocation::AllocationState;
    use crate::repositories::{BatchRef, CandidateRef};
    use crate::services::allocation_service::{AllocationUpdate, NewAllocation};
    use crate::services::batch_service::{BatchUpdate, NewBatch};
    use crate::services::{AllocationService, BatchService};
    use crate::test_support::{actor, date, memory_sink, seed_selected_candidate, setup_test_db};

    #[tokio::test]
    async fn completes_retained_candidates_once() {
        let db = setup_test_db().await;
        let batches = BatchService::new(db.clone(), memory_sink());
        let allocations = AllocationService::new(db.clone(), memory_sink());

        let closed = batches
            .create(
                &actor(),
                NewBatch {
                    name: "Closed".to_string(),
                    disability_tags: vec![],
                    start_date: date(2024, 6, 3),
                    approx_close_date: date(2024, 9, 27),
                    courses: None,
                    status: None,
                },
            )
            .await
            .unwrap();
        let running = batches
            .create(
                &actor(),
                NewBatch {
                    name: "Running".to_string(),
                    disability_tags: vec![],
                    start_date: date(2025, 1, 6),
                    approx_close_date: date(2025, 3, 28),
                    courses: None,
                    status: None,
                },
            )
            .await
            .unwrap();

        let mut closed_allocations = Vec::new();
        for name in ["A", "B", "C"] {
            let candidate = seed_selected_candidate(&db, name, None).await;
            closed_allocations.push(
                allocations
                    .allocate(
                        &actor(),
                        NewAllocation::new(BatchRef::Id(closed.id), CandidateRef::Id(candidate.id)),
                    )
                    .await
                    .unwrap(),
            );
        }
        allocations
            .update(
                &actor(),
                closed_allocations[2].id,
                AllocationUpdate {
                    is_dropout: Some(true),
                    dropout_remark: Some("left".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let other = seed_selected_candidate(&db, "D", None).await;
        let untouched = allocations
            .allocate(
                &actor(),
                NewAllocation::new(BatchRef::Id(running.id), CandidateRef::Id(other.id)),
            )
            .await
            .unwrap();

        batches
            .update(
                &actor(),
                BatchRef::Id(closed.id),
                BatchUpdate {
                    status: Some(BatchStatus::Closed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let sink = memory_sink();
        let backfill = CompletionBackfill::new(db.clone(), sink.clone());
        let report = backfill.fix_closed_batch_allocations(&Actor::system()).await.unwrap();
        assert_eq!(
            report,
            BackfillReport {
                batches_processed: 1,
                allocations_updated: 2
            }
        );
        assert_eq!(sink.entries().len(), 2);

        let first = allocations.get(closed_allocations[0].id).await.unwrap();
        assert!(matches!(
            first.state(),
            AllocationState::Completed { migrated: true, .. }
        ));
        assert_eq!(first.history().last().map(|t| t.to), Some(AllocationStatus::Completed));

        let dropout = allocations.get(closed_allocations[2].id).await.unwrap();
        assert_eq!(dropout.status, AllocationStatus::Dropout);

        let untouched = allocations.get(untouched.id).await.unwrap();
        assert_eq!(untouched.status, AllocationStatus::Allocated);

        let again = backfill.fix_closed_batch_allocations(&Actor::system()).await.unwrap();
        assert_eq!(again.batches_processed, 1);
        assert_eq!(again.allocations_updated, 0);
    }

    #[tokio::test]
    async fn nothing_to_do_without_closed_batches() {
        let db = setup_test_db().await;
        let report = CompletionBackfill::new(db, memory_sink())
            .fix_closed_batch_allocations(&Actor::system())
            .await
            .unwrap();
        assert_eq!(report, BackfillReport::default());
    }
}
