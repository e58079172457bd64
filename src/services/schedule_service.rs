use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use sea_orm::{ConnectionTrait, DatabaseConnection, IntoActiveModel, Set, TransactionTrait};
use uuid::Uuid;

use super::{TrainingError, TrainingResult, non_blank, require_batch};
use crate::audit::{Actor, AuditAction, AuditEntry, AuditSink};
use crate::config::COURSE_DAILY_CAP_MINUTES;
use crate::entities::batch_event::{self, EventType};
use crate::entities::batch_plan::{self, COURSE_ACTIVITY};
use crate::repositories::{BatchRef, PlanRepository};

#[derive(Debug, Clone)]
pub struct NewPlanEntry {
    pub batch: BatchRef,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub activity_type: String,
    pub activity_name: String,
    pub trainer: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PlanEntryUpdate {
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub activity_type: Option<String>,
    pub activity_name: Option<String>,
    pub trainer: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub batch: BatchRef,
    pub date: NaiveDate,
    pub event_type: EventType,
    pub title: String,
    pub description: Option<String>,
}

/// The slot fields the cap check looks at.
struct SlotShape<'a> {
    batch_id: i64,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    activity_type: &'a str,
    activity_name: &'a str,
}

pub struct ScheduleService {
    db: DatabaseConnection,
    audit: Arc<dyn AuditSink>,
    plans: PlanRepository,
}

impl ScheduleService {
    pub fn new(db: DatabaseConnection, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            db,
            audit,
            plans: PlanRepository::new(),
        }
    }

    pub async fn create_plan_entry(
        &self,
        actor: &Actor,
        input: NewPlanEntry,
    ) -> TrainingResult<batch_plan::Model> {
        let activity_type = normalize_activity_type(&input.activity_type)?;
        let activity_name = required_text(input.activity_name, "activity_name")?;

        let txn = self.db.begin().await?;
        let batch = require_batch(&txn, input.batch).await?;

        self.validate_slot(
            &txn,
            SlotShape {
                batch_id: batch.id,
                date: input.date,
                start_time: input.start_time,
                end_time: input.end_time,
                activity_type: &activity_type,
                activity_name: &activity_name,
            },
            None,
        )
        .await?;

        let now = Utc::now().naive_utc();
        let entry = self
            .plans
            .insert(
                &txn,
                batch_plan::ActiveModel {
                    external_id: Set(Uuid::new_v4()),
                    batch_id: Set(batch.id),
                    date: Set(input.date),
                    start_time: Set(input.start_time),
                    end_time: Set(input.end_time),
                    activity_type: Set(activity_type),
                    activity_name: Set(activity_name),
                    trainer: Set(non_blank(input.trainer)),
                    notes: Set(non_blank(input.notes)),
                    deleted_at: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                },
            )
            .await?;
        txn.commit().await?;

        tracing::debug!(plan_id = entry.id, batch_id = batch.id, "plan entry created");
        self.audit.record(
            AuditEntry::new(actor, AuditAction::Create, "batch_plan", entry.external_id).after(&entry),
        );
        Ok(entry)
    }

    /// Applies the changes and re-checks the time range and course cap,
    /// leaving the slot itself out of the running total.
    pub async fn update_plan_entry(
        &self,
        actor: &Actor,
        plan_id: i64,
        changes: PlanEntryUpdate,
    ) -> TrainingResult<batch_plan::Model> {
        let txn = self.db.begin().await?;
        let before = self
            .plans
            .find_by_id(&txn, plan_id)
            .await?
            .ok_or_else(|| TrainingError::not_found("plan entry", plan_id))?;

        let activity_type = match changes.activity_type {
            Some(raw) => normalize_activity_type(&raw)?,
            None => before.activity_type.clone(),
        };
        let activity_name = match changes.activity_name {
            Some(raw) => required_text(raw, "activity_name")?,
            None => before.activity_name.clone(),
        };
        let date = changes.date.unwrap_or(before.date);
        let start_time = changes.start_time.unwrap_or(before.start_time);
        let end_time = changes.end_time.unwrap_or(before.end_time);

        self.validate_slot(
            &txn,
            SlotShape {
                batch_id: before.batch_id,
                date,
                start_time,
                end_time,
                activity_type: &activity_type,
                activity_name: &activity_name,
            },
            Some(before.id),
        )
        .await?;

        let mut model = before.clone().into_active_model();
        model.date = Set(date);
        model.start_time = Set(start_time);
        model.end_time = Set(end_time);
        model.activity_type = Set(activity_type);
        model.activity_name = Set(activity_name);
        if let Some(trainer) = changes.trainer {
            model.trainer = Set(non_blank(Some(trainer)));
        }
        if let Some(notes) = changes.notes {
            model.notes = Set(non_blank(Some(notes)));
        }
        model.updated_at = Set(Utc::now().naive_utc());

        let after = self.plans.update(&txn, model).await?;
        txn.commit().await?;

        self.audit.record(
            AuditEntry::new(actor, AuditAction::Update, "batch_plan", after.external_id)
                .before(&before)
                .after(&after),
        );
        Ok(after)
    }

    pub async fn delete_plan_entry(&self, actor: &Actor, plan_id: i64) -> TrainingResult<()> {
        let txn = self.db.begin().await?;
        let before = self
            .plans
            .find_by_id(&txn, plan_id)
            .await?
            .ok_or_else(|| TrainingError::not_found("plan entry", plan_id))?;
        self.plans.soft_delete(&txn, before.id).await?;
        txn.commit().await?;

        self.audit.record(
            AuditEntry::new(actor, AuditAction::Delete, "batch_plan", before.external_id)
                .before(&before),
        );
        Ok(())
    }

    /// Slots from `start_date` through the following six days.
    pub async fn get_weekly_plan(
        &self,
        batch_ref: BatchRef,
        start_date: NaiveDate,
    ) -> TrainingResult<Vec<batch_plan::Model>> {
        let txn = self.db.begin().await?;
        let batch = require_batch(&txn, batch_ref).await?;
        let end_date = start_date + Duration::days(6);
        let entries = self.plans.list_range(&txn, batch.id, start_date, end_date).await?;
        txn.commit().await?;
        Ok(entries)
    }

    pub async fn get_full_plan(&self, batch_ref: BatchRef) -> TrainingResult<Vec<batch_plan::Model>> {
        let txn = self.db.begin().await?;
        let batch = require_batch(&txn, batch_ref).await?;
        let entries = self.plans.list_all(&txn, batch.id).await?;
        txn.commit().await?;
        Ok(entries)
    }

    pub async fn create_event(
        &self,
        actor: &Actor,
        input: NewEvent,
    ) -> TrainingResult<batch_event::Model> {
        let title = required_text(input.title, "title")?;

        let txn = self.db.begin().await?;
        let batch = require_batch(&txn, input.batch).await?;
        let now = Utc::now().naive_utc();
        let event = self
            .plans
            .insert_event(
                &txn,
                batch_event::ActiveModel {
                    external_id: Set(Uuid::new_v4()),
                    batch_id: Set(batch.id),
                    date: Set(input.date),
                    event_type: Set(input.event_type),
                    title: Set(title),
                    description: Set(non_blank(input.description)),
                    deleted_at: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                },
            )
            .await?;
        txn.commit().await?;

        self.audit.record(
            AuditEntry::new(actor, AuditAction::Create, "batch_event", event.external_id).after(&event),
        );
        Ok(event)
    }

    pub async fn get_events(&self, batch_ref: BatchRef) -> TrainingResult<Vec<batch_event::Model>> {
        let txn = self.db.begin().await?;
        let batch = require_batch(&txn, batch_ref).await?;
        let events = self.plans.events_for(&txn, batch.id).await?;
        txn.commit().await?;
        Ok(events)
    }

    pub async fn delete_event(&self, actor: &Actor, event_id: i64) -> TrainingResult<()> {
        let txn = self.db.begin().await?;
        let before = self
            .plans
            .find_event(&txn, event_id)
            .await?
            .ok_or_else(|| TrainingError::not_found("event", event_id))?;
        self.plans.soft_delete_event(&txn, before.id).await?;
        txn.commit().await?;

        self.audit.record(
            AuditEntry::new(actor, AuditAction::Delete, "batch_event", before.external_id)
                .before(&before),
        );
        Ok(())
    }

    async fn validate_slot<C: ConnectionTrait>(
        &self,
        db: &C,
        slot: SlotShape<'_>,
        exclude_id: Option<i64>,
    ) -> TrainingResult<()> {
        if slot.end_time <= slot.start_time {
            return Err(TrainingError::InvalidTimeRange {
                start: slot.start_time,
                end: slot.end_time,
            });
        }

        if slot.activity_type != COURSE_ACTIVITY {
            return Ok(());
        }

        // Summed in seconds with no tolerance; partial minutes count.
        let scheduled: i64 = self
            .plans
            .course_slots_on(db, slot.batch_id, slot.date, slot.activity_name, exclude_id)
            .await?
            .iter()
            .map(batch_plan::Model::duration_seconds)
            .sum();
        let total_seconds = scheduled + (slot.end_time - slot.start_time).num_seconds();

        if total_seconds > COURSE_DAILY_CAP_MINUTES * 60 {
            return Err(TrainingError::CourseCapExceeded {
                activity_name: slot.activity_name.to_string(),
                date: slot.date,
                total_minutes: (total_seconds + 59) / 60,
                cap_minutes: COURSE_DAILY_CAP_MINUTES,
            });
        }
        Ok(())
    }
}

fn normalize_activity_type(raw: &str) -> TrainingResult<String> {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(TrainingError::InvalidInput("activity_type is required".to_string()));
    }
    Ok(normalized)
}

fn required_text(raw: String, field: &str) -> TrainingResult<String> {
    non_blank(Some(raw)).ok_or_else(|| TrainingError::InvalidInput(format!("{field} is required")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::batch;
    use crate::services::BatchService;
    use crate::services::batch_service::NewBatch;
    use crate::test_support::{actor, date, memory_sink, setup_test_db};

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    async fn batch(db: &DatabaseConnection) -> batch::Model {
        BatchService::new(db.clone(), memory_sink())
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
            .unwrap()
    }

    fn slot(batch: &batch::Model, day: NaiveDate, start: NaiveTime, end: NaiveTime, name: &str) -> NewPlanEntry {
        NewPlanEntry {
            batch: BatchRef::External(batch.external_id),
            date: day,
            start_time: start,
            end_time: end,
            activity_type: "Course".to_string(),
            activity_name: name.to_string(),
            trainer: Some("Priya".to_string()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn course_cap_allows_exactly_two_hours() {
        let db = setup_test_db().await;
        let service = ScheduleService::new(db.clone(), memory_sink());
        let batch = batch(&db).await;
        let day = date(2025, 1, 7);

        service
            .create_plan_entry(&actor(), slot(&batch, day, at(9, 0), at(10, 0), "Excel"))
            .await
            .unwrap();
        let second = service
            .create_plan_entry(&actor(), slot(&batch, day, at(11, 0), at(12, 0), "Excel"))
            .await
            .unwrap();
        assert_eq!(second.activity_type, "course");

        let err = service
            .create_plan_entry(&actor(), slot(&batch, day, at(14, 0), at(14, 1), "Excel"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TrainingError::CourseCapExceeded {
                total_minutes: 121,
                cap_minutes: 120,
                ..
            }
        ));

        service
            .create_plan_entry(&actor(), slot(&batch, day, at(14, 0), at(16, 0), "Typing"))
            .await
            .unwrap();
        service
            .create_plan_entry(&actor(), slot(&batch, date(2025, 1, 8), at(9, 0), at(11, 0), "Excel"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cap_counts_seconds_of_every_slot() {
        let db = setup_test_db().await;
        let service = ScheduleService::new(db.clone(), memory_sink());
        let batch = batch(&db).await;
        let day = date(2025, 1, 7);
        let hms = |h, m, s| NaiveTime::from_hms_opt(h, m, s).unwrap();

        // 40m59s each: two fit, a third would reach 122m57s.
        for hour in [9, 10] {
            service
                .create_plan_entry(&actor(), slot(&batch, day, hms(hour, 0, 0), hms(hour, 40, 59), "Excel"))
                .await
                .unwrap();
        }
        let err = service
            .create_plan_entry(&actor(), slot(&batch, day, hms(11, 0, 0), hms(11, 40, 59), "Excel"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TrainingError::CourseCapExceeded {
                total_minutes: 123,
                ..
            }
        ));

        // 81m58s used; 38m02s fills the day exactly.
        service
            .create_plan_entry(&actor(), slot(&batch, day, hms(11, 0, 0), hms(11, 38, 2), "Excel"))
            .await
            .unwrap();
        let err = service
            .create_plan_entry(&actor(), slot(&batch, day, hms(12, 0, 0), hms(12, 0, 1), "Excel"))
            .await
            .unwrap_err();
        assert!(matches!(err, TrainingError::CourseCapExceeded { .. }));
    }

    #[tokio::test]
    async fn single_slot_over_cap_fails() {
        let db = setup_test_db().await;
        let service = ScheduleService::new(db.clone(), memory_sink());
        let batch = batch(&db).await;

        let err = service
            .create_plan_entry(&actor(), slot(&batch, date(2025, 1, 7), at(9, 0), at(11, 1), "Excel"))
            .await
            .unwrap_err();
        assert!(matches!(err, TrainingError::CourseCapExceeded { .. }));
    }

    #[tokio::test]
    async fn non_course_slots_are_not_capped() {
        let db = setup_test_db().await;
        let service = ScheduleService::new(db.clone(), memory_sink());
        let batch = batch(&db).await;
        let mut lunch = slot(&batch, date(2025, 1, 7), at(9, 0), at(17, 0), "Field visit");
        lunch.activity_type = "activity".to_string();

        service.create_plan_entry(&actor(), lunch).await.unwrap();
    }

    #[tokio::test]
    async fn end_must_follow_start() {
        let db = setup_test_db().await;
        let service = ScheduleService::new(db.clone(), memory_sink());
        let batch = batch(&db).await;

        let err = service
            .create_plan_entry(&actor(), slot(&batch, date(2025, 1, 7), at(10, 0), at(10, 0), "Excel"))
            .await
            .unwrap_err();
        assert!(matches!(err, TrainingError::InvalidTimeRange { .. }));
    }

    #[tokio::test]
    async fn update_rechecks_the_cap_without_counting_itself() {
        let db = setup_test_db().await;
        let service = ScheduleService::new(db.clone(), memory_sink());
        let batch = batch(&db).await;
        let day = date(2025, 1, 7);

        let morning = service
            .create_plan_entry(&actor(), slot(&batch, day, at(9, 0), at(10, 0), "Excel"))
            .await
            .unwrap();
        service
            .create_plan_entry(&actor(), slot(&batch, day, at(11, 0), at(11, 30), "Excel"))
            .await
            .unwrap();

        let widened = service
            .update_plan_entry(
                &actor(),
                morning.id,
                PlanEntryUpdate {
                    end_time: Some(at(10, 30)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(widened.end_time, at(10, 30));
        assert_eq!(widened.trainer.as_deref(), Some("Priya"));

        let err = service
            .update_plan_entry(
                &actor(),
                morning.id,
                PlanEntryUpdate {
                    end_time: Some(at(10, 31)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TrainingError::CourseCapExceeded { .. }));

        let err = service
            .update_plan_entry(
                &actor(),
                morning.id,
                PlanEntryUpdate {
                    start_time: Some(at(12, 0)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TrainingError::InvalidTimeRange { .. }));
    }

    #[tokio::test]
    async fn weekly_plan_covers_seven_days() {
        let db = setup_test_db().await;
        let service = ScheduleService::new(db.clone(), memory_sink());
        let batch = batch(&db).await;

        for day in [6, 12, 13] {
            service
                .create_plan_entry(&actor(), slot(&batch, date(2025, 1, day), at(9, 0), at(10, 0), "Excel"))
                .await
                .unwrap();
        }

        let week = service
            .get_weekly_plan(BatchRef::Id(batch.id), date(2025, 1, 6))
            .await
            .unwrap();
        let days: Vec<_> = week.iter().map(|e| e.date).collect();
        assert_eq!(days, vec![date(2025, 1, 6), date(2025, 1, 12)]);

        let full = service.get_full_plan(BatchRef::Id(batch.id)).await.unwrap();
        assert_eq!(full.len(), 3);

        service.delete_plan_entry(&actor(), full[0].id).await.unwrap();
        let full = service.get_full_plan(BatchRef::Id(batch.id)).await.unwrap();
        assert_eq!(full.len(), 2);

        let err = service
            .get_weekly_plan(BatchRef::Id(9_999), date(2025, 1, 6))
            .await
            .unwrap_err();
        assert!(matches!(err, TrainingError::NotFound { .. }));
    }

    #[tokio::test]
    async fn deleted_slots_free_the_cap() {
        let db = setup_test_db().await;
        let service = ScheduleService::new(db.clone(), memory_sink());
        let batch = batch(&db).await;
        let day = date(2025, 1, 7);

        let long = service
            .create_plan_entry(&actor(), slot(&batch, day, at(9, 0), at(11, 0), "Excel"))
            .await
            .unwrap();
        service.delete_plan_entry(&actor(), long.id).await.unwrap();
        service
            .create_plan_entry(&actor(), slot(&batch, day, at(13, 0), at(15, 0), "Excel"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn events_are_listed_and_deleted() {
        let db = setup_test_db().await;
        let service = ScheduleService::new(db.clone(), memory_sink());
        let batch = batch(&db).await;

        let holiday = service
            .create_event(
                &actor(),
                NewEvent {
                    batch: BatchRef::Id(batch.id),
                    date: date(2025, 1, 26),
                    event_type: EventType::Holiday,
                    title: "Republic Day".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();
        service
            .create_event(
                &actor(),
                NewEvent {
                    batch: BatchRef::Id(batch.id),
                    date: date(2025, 1, 15),
                    event_type: EventType::Event,
                    title: "Employer visit".to_string(),
                    description: Some("Guest talk".to_string()),
                },
            )
            .await
            .unwrap();

        let events = service.get_events(BatchRef::Id(batch.id)).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "Employer visit");

        service.delete_event(&actor(), holiday.id).await.unwrap();
        let events = service.get_events(BatchRef::Id(batch.id)).await.unwrap();
        assert_eq!(events.len(), 1);

        let err = service.delete_event(&actor(), holiday.id).await.unwrap_err();
        assert!(matches!(err, TrainingError::NotFound { entity: "event", .. }));
    }
}
