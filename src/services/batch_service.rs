use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, IntoActiveModel, Set, TransactionTrait,
};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::{TrainingError, TrainingResult, non_blank, require_batch};
use crate::audit::{Actor, AuditAction, AuditEntry, AuditSink};
use crate::entities::batch::{self, BatchStatus, encode_tags};
use crate::entities::batch_extension;
use crate::repositories::{BatchFilter, BatchRef, BatchRepository};

#[derive(Debug, Clone)]
pub struct NewBatch {
    pub name: String,
    pub disability_tags: Vec<String>,
    pub start_date: NaiveDate,
    pub approx_close_date: NaiveDate,
    pub courses: Option<Value>,
    pub status: Option<BatchStatus>,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct BatchUpdate {
    pub name: Option<String>,
    pub disability_tags: Option<Vec<String>>,
    pub start_date: Option<NaiveDate>,
    pub approx_close_date: Option<NaiveDate>,
    pub courses: Option<Value>,
    pub status: Option<BatchStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchDetails {
    pub batch: batch::Model,
    pub extensions: Vec<batch_extension::Model>,
}

pub struct BatchService {
    db: DatabaseConnection,
    audit: Arc<dyn AuditSink>,
    batches: BatchRepository,
}

impl BatchService {
    pub fn new(db: DatabaseConnection, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            db,
            audit,
            batches: BatchRepository::new(),
        }
    }

    pub async fn create(&self, actor: &Actor, input: NewBatch) -> TrainingResult<batch::Model> {
        let name = non_blank(Some(input.name))
            .ok_or_else(|| TrainingError::InvalidInput("batch name is required".to_string()))?;
        check_date_order(input.start_date, input.approx_close_date)?;

        let now = Utc::now().naive_utc();
        let model = batch::ActiveModel {
            external_id: Set(Uuid::new_v4()),
            name: Set(name),
            disability_tags: Set(encode_tags(&input.disability_tags)),
            start_date: Set(input.start_date),
            approx_close_date: Set(input.approx_close_date),
            total_extension_days: Set(0),
            courses: Set(input.courses),
            status: Set(input.status.unwrap_or(BatchStatus::Planned)),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let txn = self.db.begin().await?;
        let batch = self.batches.insert(&txn, model).await?;
        txn.commit().await?;

        tracing::info!(batch_id = batch.id, name = %batch.name, "batch created");
        self.audit.record(
            AuditEntry::new(actor, AuditAction::Create, "batch", batch.external_id).after(&batch),
        );
        Ok(batch)
    }

    pub async fn get(&self, batch_ref: BatchRef) -> TrainingResult<BatchDetails> {
        let batch = require_batch(&self.db, batch_ref).await?;
        let extensions = self.batches.extensions_for(&self.db, batch.id).await?;
        Ok(BatchDetails { batch, extensions })
    }

    pub async fn list(
        &self,
        filter: &BatchFilter,
        page: u64,
        page_size: u64,
    ) -> TrainingResult<(Vec<batch::Model>, u64)> {
        Ok(self
            .batches
            .find_all_with_pagination(&self.db, filter, page, page_size)
            .await?)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        batch_ref: BatchRef,
        changes: BatchUpdate,
    ) -> TrainingResult<batch::Model> {
        let txn = self.db.begin().await?;
        let before = self.require_locked(&txn, batch_ref).await?;

        let start_date = changes.start_date.unwrap_or(before.start_date);
        let close_date = changes.approx_close_date.unwrap_or(before.approx_close_date);
        check_date_order(start_date, close_date)?;

        let mut model = before.clone().into_active_model();

        if let Some(name) = changes.name {
            let name = non_blank(Some(name))
                .ok_or_else(|| TrainingError::InvalidInput("batch name is required".to_string()))?;
            model.name = Set(name);
        }
        if let Some(tags) = changes.disability_tags {
            model.disability_tags = Set(encode_tags(&tags));
        }
        if let Some(start) = changes.start_date {
            model.start_date = Set(start);
        }
        if let Some(close) = changes.approx_close_date {
            model.approx_close_date = Set(close);
        }
        if let Some(courses) = changes.courses {
            model.courses = Set(Some(courses));
        }

        let mut released = 0;
        if let Some(next) = changes.status {
            if !before.status.can_transition_to(next) {
                return Err(TrainingError::InvalidStatusTransition {
                    from: before.status.as_str(),
                    to: next.as_str(),
                });
            }
            if next != before.status
                && !self
                    .batches
                    .transition_status(&txn, before.id, before.status, next)
                    .await?
            {
                return Err(TrainingError::ConcurrentModification { resource: "batch" });
            }
            if before.status.is_active() && !next.is_active() {
                released = self.batches.release_allocations(&txn, before.id).await?;
            }
        }

        model.updated_at = Set(Utc::now().naive_utc());
        let after = model.update(&txn).await?;
        txn.commit().await?;

        tracing::info!(
            batch_id = after.id,
            status = after.status.as_str(),
            released_allocations = released,
            "batch updated"
        );
        self.audit.record(
            AuditEntry::new(actor, AuditAction::Update, "batch", after.external_id)
                .before(&before)
                .after(&after),
        );
        Ok(after)
    }

    /// Pushes the close date out and records the extension.
    pub async fn extend(
        &self,
        actor: &Actor,
        batch_ref: BatchRef,
        new_close_date: NaiveDate,
        reason: Option<String>,
    ) -> TrainingResult<BatchDetails> {
        let txn = self.db.begin().await?;
        let before = self.require_locked(&txn, batch_ref).await?;

        if !before.status.is_active() {
            return Err(TrainingError::InvalidStatusTransition {
                from: before.status.as_str(),
                to: BatchStatus::Extended.as_str(),
            });
        }

        let current_close_date = before.approx_close_date;
        let days = (new_close_date - current_close_date).num_days();
        if days <= 0 {
            return Err(TrainingError::InvalidExtension {
                current_close_date,
                new_close_date,
            });
        }
        let extension_days = i32::try_from(days)
            .map_err(|_| TrainingError::InvalidInput(format!("extension of {days} days is too long")))?;

        let next_status = (before.status == BatchStatus::Running).then_some(BatchStatus::Extended);
        let applied = self
            .batches
            .apply_extension(
                &txn,
                before.id,
                before.status,
                current_close_date,
                new_close_date,
                extension_days,
                next_status,
            )
            .await?;
        if !applied {
            return Err(TrainingError::ConcurrentModification { resource: "batch" });
        }

        let now = Utc::now().naive_utc();
        let extension = self
            .batches
            .insert_extension(
                &txn,
                batch_extension::ActiveModel {
                    external_id: Set(Uuid::new_v4()),
                    batch_id: Set(before.id),
                    previous_close_date: Set(current_close_date),
                    new_close_date: Set(new_close_date),
                    extension_days: Set(extension_days),
                    reason: Set(non_blank(reason)),
                    deleted_at: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                },
            )
            .await?;

        let batch = self
            .batches
            .find_by_id(&txn, before.id)
            .await?
            .ok_or_else(|| TrainingError::not_found("batch", before.id))?;
        let extensions = self.batches.extensions_for(&txn, before.id).await?;
        txn.commit().await?;

        tracing::info!(
            batch_id = batch.id,
            extension_days,
            total_extension_days = batch.total_extension_days,
            "batch extended"
        );
        self.audit.record(
            AuditEntry::new(actor, AuditAction::Create, "batch_extension", extension.external_id)
                .before(&before)
                .after(&extension),
        );
        Ok(BatchDetails { batch, extensions })
    }

    pub async fn delete(&self, actor: &Actor, batch_ref: BatchRef) -> TrainingResult<()> {
        let txn = self.db.begin().await?;
        let before = require_batch(&txn, batch_ref).await?;
        self.batches.soft_delete(&txn, before.id).await?;
        let released = self.batches.release_allocations(&txn, before.id).await?;
        txn.commit().await?;

        tracing::info!(batch_id = before.id, released_allocations = released, "batch deleted");
        self.audit.record(
            AuditEntry::new(actor, AuditAction::Delete, "batch", before.external_id).before(&before),
        );
        Ok(())
    }
}

impl BatchService {
    async fn require_locked<C: ConnectionTrait>(
        &self,
        db: &C,
        batch_ref: BatchRef,
    ) -> TrainingResult<batch::Model> {
        let batch = require_batch(db, batch_ref).await?;
        self.batches
            .lock_by_id(db, batch.id)
            .await?
            .ok_or_else(|| TrainingError::not_found("batch", batch_ref))
    }
}

fn check_date_order(start: NaiveDate, close: NaiveDate) -> TrainingResult<()> {
    if close < start {
        return Err(TrainingError::InvalidInput(format!(
            "close date {close} is before start date {start}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{BatchSortField, SortOrder};
    use crate::services::AllocationService;
    use crate::services::allocation_service::NewAllocation;
    use crate::repositories::CandidateRef;
    use crate::test_support::{actor, date, memory_sink, seed_selected_candidate, setup_test_db};

    fn new_batch(name: &str, tags: &[&str]) -> NewBatch {
        NewBatch {
            name: name.to_string(),
            disability_tags: tags.iter().map(|t| t.to_string()).collect(),
            start_date: date(2025, 1, 6),
            approx_close_date: date(2025, 3, 28),
            courses: Some(serde_json::json!([{ "name": "Excel", "hours": 40 }])),
            status: None,
        }
    }

    #[tokio::test]
    async fn create_then_get_by_external_id() {
        let db = setup_test_db().await;
        let sink = memory_sink();
        let service = BatchService::new(db, sink.clone());

        let created = service
            .create(&actor(), new_batch("  Cohort A ", &["Visual"]))
            .await
            .unwrap();
        assert_eq!(created.name, "Cohort A");
        assert_eq!(created.status, BatchStatus::Planned);
        assert_eq!(created.tags(), vec!["visual"]);

        let details = service
            .get(BatchRef::External(created.external_id))
            .await
            .unwrap();
        assert_eq!(details.batch.id, created.id);
        assert!(details.extensions.is_empty());
        assert_eq!(sink.entries().len(), 1);
    }

    #[tokio::test]
    async fn extensions_accumulate_days_and_history() {
        let db = setup_test_db().await;
        let service = BatchService::new(db, memory_sink());
        let batch = service.create(&actor(), new_batch("B", &[])).await.unwrap();
        service
            .update(
                &actor(),
                BatchRef::Id(batch.id),
                BatchUpdate {
                    status: Some(BatchStatus::Running),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let first = service
            .extend(&actor(), BatchRef::Id(batch.id), date(2025, 4, 2), Some("holidays".into()))
            .await
            .unwrap();
        assert_eq!(first.batch.total_extension_days, 5);
        assert_eq!(first.batch.status, BatchStatus::Extended);

        let second = service
            .extend(&actor(), BatchRef::Id(batch.id), date(2025, 4, 5), None)
            .await
            .unwrap();
        assert_eq!(second.batch.total_extension_days, 8);
        assert_eq!(second.batch.approx_close_date, date(2025, 4, 5));
        assert_eq!(second.extensions.len(), 2);
        assert_eq!(second.extensions[0].previous_close_date, date(2025, 3, 28));
        assert_eq!(second.extensions[1].previous_close_date, date(2025, 4, 2));
        assert_eq!(second.extensions[1].extension_days, 3);
    }

    #[tokio::test]
    async fn extension_must_move_the_date_forward() {
        let db = setup_test_db().await;
        let service = BatchService::new(db, memory_sink());
        let batch = service.create(&actor(), new_batch("B", &[])).await.unwrap();

        let err = service
            .extend(&actor(), BatchRef::Id(batch.id), date(2025, 3, 28), None)
            .await
            .unwrap_err();
        assert!(matches!(err, TrainingError::InvalidExtension { .. }));

        let details = service.get(BatchRef::Id(batch.id)).await.unwrap();
        assert_eq!(details.batch.total_extension_days, 0);
        assert!(details.extensions.is_empty());
    }

    #[tokio::test]
    async fn closed_batches_cannot_be_extended() {
        let db = setup_test_db().await;
        let service = BatchService::new(db, memory_sink());
        let batch = service.create(&actor(), new_batch("B", &[])).await.unwrap();
        service
            .update(
                &actor(),
                BatchRef::Id(batch.id),
                BatchUpdate {
                    status: Some(BatchStatus::Closed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = service
            .extend(&actor(), BatchRef::Id(batch.id), date(2025, 4, 30), None)
            .await
            .unwrap_err();
        assert!(matches!(err, TrainingError::InvalidStatusTransition { .. }));
    }

    #[tokio::test]
    async fn stale_close_date_is_rejected() {
        let db = setup_test_db().await;
        let service = BatchService::new(db.clone(), memory_sink());
        let batch = service.create(&actor(), new_batch("B", &[])).await.unwrap();

        let applied = BatchRepository::new()
            .apply_extension(
                &db,
                batch.id,
                BatchStatus::Planned,
                date(2025, 3, 1),
                date(2025, 4, 1),
                31,
                None,
            )
            .await
            .unwrap();
        assert!(!applied);
    }

    #[tokio::test]
    async fn extension_read_before_closing_does_not_reopen_the_batch() {
        let db = setup_test_db().await;
        let service = BatchService::new(db.clone(), memory_sink());
        let mut input = new_batch("B", &[]);
        input.status = Some(BatchStatus::Running);
        let batch = service.create(&actor(), input).await.unwrap();

        service
            .update(
                &actor(),
                BatchRef::Id(batch.id),
                BatchUpdate {
                    status: Some(BatchStatus::Closed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // An extension computed from the earlier running snapshot.
        let repo = BatchRepository::new();
        let applied = repo
            .apply_extension(
                &db,
                batch.id,
                BatchStatus::Running,
                date(2025, 3, 28),
                date(2025, 4, 2),
                5,
                Some(BatchStatus::Extended),
            )
            .await
            .unwrap();
        assert!(!applied);

        let after = repo.find_by_id(&db, batch.id).await.unwrap().unwrap();
        assert_eq!(after.status, BatchStatus::Closed);
        assert_eq!(after.total_extension_days, 0);
        assert_eq!(after.approx_close_date, date(2025, 3, 28));
    }

    #[tokio::test]
    async fn status_write_requires_the_status_that_was_read() {
        let db = setup_test_db().await;
        let service = BatchService::new(db.clone(), memory_sink());
        let batch = service.create(&actor(), new_batch("B", &[])).await.unwrap();
        let repo = BatchRepository::new();

        let stale = repo
            .transition_status(&db, batch.id, BatchStatus::Running, BatchStatus::Closed)
            .await
            .unwrap();
        assert!(!stale);
        let current = repo.find_by_id(&db, batch.id).await.unwrap().unwrap();
        assert_eq!(current.status, BatchStatus::Planned);

        let fresh = repo
            .transition_status(&db, batch.id, BatchStatus::Planned, BatchStatus::Running)
            .await
            .unwrap();
        assert!(fresh);
    }

    #[tokio::test]
    async fn status_cannot_move_backwards() {
        let db = setup_test_db().await;
        let service = BatchService::new(db, memory_sink());
        let batch = service.create(&actor(), new_batch("B", &[])).await.unwrap();
        let to = |status| BatchUpdate {
            status: Some(status),
            ..Default::default()
        };

        service
            .update(&actor(), BatchRef::Id(batch.id), to(BatchStatus::Running))
            .await
            .unwrap();
        let err = service
            .update(&actor(), BatchRef::Id(batch.id), to(BatchStatus::Planned))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TrainingError::InvalidStatusTransition {
                from: "running",
                to: "planned"
            }
        ));
    }

    #[tokio::test]
    async fn update_writes_only_supplied_fields() {
        let db = setup_test_db().await;
        let service = BatchService::new(db, memory_sink());
        let batch = service.create(&actor(), new_batch("B", &["hearing"])).await.unwrap();

        let updated = service
            .update(
                &actor(),
                BatchRef::Id(batch.id),
                BatchUpdate {
                    name: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.disability_tags, batch.disability_tags);
        assert_eq!(updated.approx_close_date, batch.approx_close_date);
        assert_eq!(updated.courses, batch.courses);
    }

    #[tokio::test]
    async fn closing_releases_the_active_guard() {
        let db = setup_test_db().await;
        let batches = BatchService::new(db.clone(), memory_sink());
        let allocations = AllocationService::new(db.clone(), memory_sink());
        let batch = batches.create(&actor(), new_batch("B", &[])).await.unwrap();
        let candidate = seed_selected_candidate(&db, "Asha", None).await;

        let allocation = allocations
            .allocate(
                &actor(),
                NewAllocation::new(BatchRef::Id(batch.id), CandidateRef::Id(candidate.id)),
            )
            .await
            .unwrap();
        assert_eq!(allocation.active_candidate_id, Some(candidate.id));

        batches
            .update(
                &actor(),
                BatchRef::Id(batch.id),
                BatchUpdate {
                    status: Some(BatchStatus::Closed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let reloaded = allocations.get(allocation.id).await.unwrap();
        assert_eq!(reloaded.active_candidate_id, None);
    }

    #[tokio::test]
    async fn list_filters_sorts_and_counts() {
        let db = setup_test_db().await;
        let service = BatchService::new(db, memory_sink());
        service.create(&actor(), new_batch("Charlie", &["visual"])).await.unwrap();
        service.create(&actor(), new_batch("Alpha", &["visual", "hearing"])).await.unwrap();
        service.create(&actor(), new_batch("Bravo", &["locomotor"])).await.unwrap();

        let filter = BatchFilter {
            disability_tag: Some("Visual".to_string()),
            sort_by: BatchSortField::Name,
            order: SortOrder::Asc,
            ..Default::default()
        };
        let (items, total) = service.list(&filter, 1, 10).await.unwrap();
        assert_eq!(total, 2);
        let names: Vec<_> = items.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Charlie"]);

        let (page_two, total) = service
            .list(
                &BatchFilter {
                    sort_by: BatchSortField::Name,
                    order: SortOrder::Asc,
                    ..Default::default()
                },
                2,
                2,
            )
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(page_two.len(), 1);
        assert_eq!(page_two[0].name, "Charlie");

        let (empty, total) = service
            .list(
                &BatchFilter {
                    search: Some("zulu".to_string()),
                    ..Default::default()
                },
                1,
                10,
            )
            .await
            .unwrap();
        assert!(empty.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn deleted_batches_disappear() {
        let db = setup_test_db().await;
        let service = BatchService::new(db, memory_sink());
        let batch = service.create(&actor(), new_batch("B", &[])).await.unwrap();

        service.delete(&actor(), BatchRef::Id(batch.id)).await.unwrap();

        let err = service.get(BatchRef::Id(batch.id)).await.unwrap_err();
        assert!(matches!(err, TrainingError::NotFound { entity: "batch", .. }));
    }
}
