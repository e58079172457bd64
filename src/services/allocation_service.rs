use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbErr, IntoActiveModel, Set, TransactionTrait,
};
use serde_json::Value;
use uuid::Uuid;

use super::error::{is_unique_violation, unique_violation_detail};
use super::{TrainingError, TrainingResult, non_blank, require_batch, require_candidate};
use crate::audit::{Actor, AuditAction, AuditEntry, AuditSink};
use crate::entities::allocation::{self, AllocationState, AllocationStatus, StatusTransition};
use crate::entities::batch::{self, BatchStatus};
use crate::repositories::{
    AllocationListFilter, AllocationRepository, BatchRef, BatchRepository, CandidateDirectory,
    CandidateProfile, CandidateRef,
};

#[derive(Debug, Clone)]
pub struct NewAllocation {
    pub batch: BatchRef,
    pub candidate: CandidateRef,
    pub state: Option<AllocationState>,
    pub extras: Option<Value>,
}

impl NewAllocation {
    pub fn new(batch: BatchRef, candidate: CandidateRef) -> Self {
        Self {
            batch,
            candidate,
            state: None,
            extras: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AllocationUpdate {
    pub is_dropout: Option<bool>,
    pub dropout_remark: Option<String>,
    pub state: Option<AllocationState>,
    pub extras: Option<Value>,
    pub note: Option<String>,
}

pub struct AllocationService {
    db: DatabaseConnection,
    audit: Arc<dyn AuditSink>,
    allocations: AllocationRepository,
    batches: BatchRepository,
    candidates: CandidateDirectory,
}

impl AllocationService {
    pub fn new(db: DatabaseConnection, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            db,
            audit,
            allocations: AllocationRepository::new(),
            batches: BatchRepository::new(),
            candidates: CandidateDirectory::new(),
        }
    }

    pub async fn get(&self, allocation_id: i64) -> TrainingResult<allocation::Model> {
        self.require(&self.db, allocation_id).await
    }

    /// Places a candidate in a batch. A planned batch starts running with its
    /// first allocation.
    pub async fn allocate(
        &self,
        actor: &Actor,
        input: NewAllocation,
    ) -> TrainingResult<allocation::Model> {
        let txn = self.db.begin().await?;
        let resolved = require_batch(&txn, input.batch).await?;
        let batch = self
            .batches
            .lock_by_id(&txn, resolved.id)
            .await?
            .ok_or_else(|| TrainingError::not_found("batch", input.batch))?;
        let candidate = require_candidate(&txn, input.candidate).await?;

        if !batch.accepts_disability(candidate.disability_type.as_deref()) {
            return Err(TrainingError::DisabilityMismatch {
                candidate_type: candidate.disability_type.clone(),
                batch_tags: batch.tags(),
            });
        }

        if self
            .allocations
            .find_pair(&txn, batch.id, candidate.id)
            .await?
            .is_some()
        {
            return Err(TrainingError::AlreadyAllocated {
                batch: batch.external_id.to_string(),
                candidate: candidate.external_id.to_string(),
            });
        }

        let state = match input.state {
            Some(AllocationState::Dropout { remark }) => AllocationState::Dropout {
                remark: non_blank(Some(remark)).ok_or(TrainingError::RemarkRequired)?,
            },
            Some(state) => state,
            None => AllocationState::Allocated,
        };

        if state.status() != AllocationStatus::Dropout {
            self.ensure_not_active_elsewhere(&txn, &candidate, None).await?;
        }

        let batch_status = if batch.status == BatchStatus::Planned
            && self.batches.mark_running_if_planned(&txn, batch.id).await?
        {
            tracing::info!(batch_id = batch.id, "batch started with its first allocation");
            BatchStatus::Running
        } else {
            // The guard follows the stored status, not the snapshot read above.
            self.batches
                .find_by_id(&txn, batch.id)
                .await?
                .map(|current| current.status)
                .ok_or_else(|| TrainingError::not_found("batch", batch.id))?
        };

        let now = Utc::now().naive_utc();
        let history = vec![StatusTransition {
            from: None,
            to: state.status(),
            at: now,
            note: Some("allocated".to_string()),
        }];

        let mut model = allocation::ActiveModel {
            external_id: Set(Uuid::new_v4()),
            batch_id: Set(batch.id),
            candidate_id: Set(candidate.id),
            status_history: Set(history_json(&history)),
            extras: Set(input.extras),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        apply_state(&mut model, &state, candidate.id, batch_status.is_active());

        let created = self
            .allocations
            .insert(&txn, model)
            .await
            .map_err(|err| allocation_conflict(err, &batch, &candidate))?;
        txn.commit().await?;

        tracing::info!(
            allocation_id = created.id,
            batch_id = batch.id,
            candidate_id = candidate.id,
            "candidate allocated"
        );
        self.audit.record(
            AuditEntry::new(actor, AuditAction::Create, "allocation", created.external_id)
                .after(&created),
        );
        Ok(created)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        allocation_id: i64,
        changes: AllocationUpdate,
    ) -> TrainingResult<allocation::Model> {
        let txn = self.db.begin().await?;
        let before = self.require(&txn, allocation_id).await?;
        let current = before.state();

        let remark = non_blank(changes.dropout_remark.clone()).or_else(|| before.dropout_remark.clone());

        let next = match (changes.is_dropout, changes.state.clone()) {
            (Some(false), Some(AllocationState::Dropout { .. })) => {
                return Err(TrainingError::InvalidInput(
                    "is_dropout=false contradicts a dropout state".to_string(),
                ));
            }
            (Some(true) | None, Some(AllocationState::Dropout { remark: given })) => {
                AllocationState::Dropout {
                    remark: non_blank(Some(given))
                        .or(remark)
                        .ok_or(TrainingError::RemarkRequired)?,
                }
            }
            (Some(true), _) => AllocationState::Dropout {
                remark: remark.ok_or(TrainingError::RemarkRequired)?,
            },
            (_, Some(state)) => state,
            (Some(false), None) if current.status() == AllocationStatus::Dropout => {
                AllocationState::Allocated
            }
            _ => current.clone(),
        };

        let batch = self.batches.find_by_id(&txn, before.batch_id).await?;
        let batch_active = batch.as_ref().is_some_and(|b| b.status.is_active());

        let leaving_dropout = current.status() == AllocationStatus::Dropout
            && next.status() != AllocationStatus::Dropout;
        if leaving_dropout && batch_active {
            let candidate = require_candidate(&txn, CandidateRef::Id(before.candidate_id)).await?;
            self.ensure_not_active_elsewhere(&txn, &candidate, Some(before.id))
                .await?;
        }

        let mut model = before.clone().into_active_model();
        apply_state(&mut model, &next, before.candidate_id, batch_active);

        if next.status() != AllocationStatus::Dropout {
            if let Some(remark) = non_blank(changes.dropout_remark) {
                model.dropout_remark = Set(Some(remark));
            }
        }

        if next != current {
            let mut history = before.history();
            history.push(StatusTransition {
                from: Some(current.status()),
                to: next.status(),
                at: Utc::now().naive_utc(),
                note: non_blank(changes.note),
            });
            model.status_history = Set(history_json(&history));
        }

        if let Some(extras) = changes.extras {
            model.extras = Set(Some(extras));
        }
        model.updated_at = Set(Utc::now().naive_utc());

        let after = self.allocations.update(&txn, model).await.map_err(|err| {
            if is_unique_violation(&err) {
                TrainingError::ActiveElsewhere {
                    batch: before.batch_id.to_string(),
                    candidate: before.candidate_id.to_string(),
                }
            } else {
                err.into()
            }
        })?;
        txn.commit().await?;

        tracing::info!(
            allocation_id = after.id,
            status = ?after.status,
            "allocation updated"
        );
        self.audit.record(
            AuditEntry::new(actor, AuditAction::Update, "allocation", after.external_id)
                .before(&before)
                .after(&after),
        );
        Ok(after)
    }

    /// Soft-deletes the allocation and frees the candidate.
    pub async fn remove(&self, actor: &Actor, allocation_id: i64) -> TrainingResult<()> {
        let txn = self.db.begin().await?;
        let before = self.require(&txn, allocation_id).await?;

        let now = Utc::now().naive_utc();
        let mut model = before.clone().into_active_model();
        model.active_candidate_id = Set(None);
        model.deleted_at = Set(Some(now));
        model.updated_at = Set(now);
        self.allocations.update(&txn, model).await?;
        txn.commit().await?;

        tracing::info!(allocation_id = before.id, "allocation removed");
        self.audit.record(
            AuditEntry::new(actor, AuditAction::Delete, "allocation", before.external_id)
                .before(&before),
        );
        Ok(())
    }

    /// Selected candidates without an active allocation, optionally narrowed
    /// to those the batch accepts.
    pub async fn list_eligible(
        &self,
        batch_ref: Option<BatchRef>,
    ) -> TrainingResult<Vec<CandidateProfile>> {
        let txn = self.db.begin().await?;
        let batch = match batch_ref {
            Some(batch_ref) => Some(require_batch(&txn, batch_ref).await?),
            None => None,
        };

        let selected = self.candidates.selected_candidates(&txn).await?;
        let active: HashSet<i64> = self
            .allocations
            .active_candidate_ids(&txn)
            .await?
            .into_iter()
            .collect();
        txn.commit().await?;

        Ok(selected
            .into_iter()
            .filter(|candidate| !active.contains(&candidate.id))
            .filter(|candidate| {
                batch
                    .as_ref()
                    .is_none_or(|b| b.accepts_disability(candidate.disability_type.as_deref()))
            })
            .collect())
    }

    pub async fn list_by_batch(
        &self,
        batch_ref: BatchRef,
        filter: &AllocationListFilter,
    ) -> TrainingResult<Vec<allocation::Model>> {
        let txn = self.db.begin().await?;
        let batch = require_batch(&txn, batch_ref).await?;
        let allocations = self.allocations.list_by_batch(&txn, batch.id, filter).await?;
        txn.commit().await?;
        Ok(allocations)
    }

    pub async fn list_by_candidate(
        &self,
        candidate_ref: CandidateRef,
    ) -> TrainingResult<Vec<allocation::Model>> {
        let txn = self.db.begin().await?;
        let candidate = require_candidate(&txn, candidate_ref).await?;
        let allocations = self.allocations.list_by_candidate(&txn, candidate.id).await?;
        txn.commit().await?;
        Ok(allocations)
    }

    async fn require<C: ConnectionTrait>(
        &self,
        db: &C,
        allocation_id: i64,
    ) -> TrainingResult<allocation::Model> {
        self.allocations
            .find_by_id(db, allocation_id)
            .await?
            .ok_or_else(|| TrainingError::not_found("allocation", allocation_id))
    }

    async fn ensure_not_active_elsewhere<C: ConnectionTrait>(
        &self,
        db: &C,
        candidate: &CandidateProfile,
        except: Option<i64>,
    ) -> TrainingResult<()> {
        if let Some(active) = self
            .allocations
            .find_active_for_candidate(db, candidate.id)
            .await?
            .filter(|active| Some(active.id) != except)
        {
            let batch = self.batches.find_by_id(db, active.batch_id).await?;
            return Err(TrainingError::ActiveElsewhere {
                batch: batch
                    .map(|b| b.external_id.to_string())
                    .unwrap_or_else(|| active.batch_id.to_string()),
                candidate: candidate.external_id.to_string(),
            });
        }
        Ok(())
    }
}

/// Writes the state columns and the active guard.
pub(crate) fn apply_state(
    model: &mut allocation::ActiveModel,
    state: &AllocationState,
    candidate_id: i64,
    batch_active: bool,
) {
    model.status = Set(state.status());
    match state {
        AllocationState::Allocated => {
            model.completed_at = Set(None);
            model.migrated = Set(false);
            model.is_dropout = Set(false);
        }
        AllocationState::Completed { at, migrated } => {
            model.completed_at = Set(Some(*at));
            model.migrated = Set(*migrated);
            model.is_dropout = Set(false);
        }
        AllocationState::Dropout { remark } => {
            model.completed_at = Set(None);
            model.migrated = Set(false);
            model.is_dropout = Set(true);
            model.dropout_remark = Set(Some(remark.clone()));
        }
    }

    let holds_guard = batch_active && !matches!(state, AllocationState::Dropout { .. });
    model.active_candidate_id = Set(holds_guard.then_some(candidate_id));
}

pub(crate) fn history_json(history: &[StatusTransition]) -> Value {
    Value::Array(
        history
            .iter()
            .filter_map(|entry| serde_json::to_value(entry).ok())
            .collect(),
    )
}

pub(crate) fn completed_now(migrated: bool) -> AllocationState {
    AllocationState::Completed {
        at: now(),
        migrated,
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Maps a rejected insert to the index that fired: the active guard or the
/// live (batch, candidate) pair.
fn allocation_conflict(
    err: DbErr,
    batch: &batch::Model,
    candidate: &CandidateProfile,
) -> TrainingError {
    let batch = batch.external_id.to_string();
    let candidate = candidate.external_id.to_string();
    match unique_violation_detail(&err) {
        Some(detail) if detail.contains("active_candidate") => {
            TrainingError::ActiveElsewhere { batch, candidate }
        }
        Some(_) => TrainingError::AlreadyAllocated { batch, candidate },
        None => err.into(),
    }
}
