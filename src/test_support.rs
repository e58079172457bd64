//! Fresh migrated in-memory databases and seed helpers for tests.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use uuid::Uuid;

use crate::audit::{Actor, MemoryAuditSink};
use crate::entities::{candidate, counseling_record};

pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("connect in-memory sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

pub fn memory_sink() -> Arc<MemoryAuditSink> {
    Arc::new(MemoryAuditSink::default())
}

pub fn actor() -> Actor {
    Actor::new("trainer-1", Some("trainer".to_string()))
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub async fn seed_candidate(
    db: &DatabaseConnection,
    full_name: &str,
    disability_type: Option<&str>,
) -> candidate::Model {
    let now = Utc::now().naive_utc();
    candidate::ActiveModel {
        external_id: Set(Uuid::new_v4()),
        full_name: Set(full_name.to_string()),
        disability_type: Set(disability_type.map(str::to_string)),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert candidate")
}

/// Adds a counseling record; `age_minutes` pushes `created_at` into the past
/// so tests control which record is the latest.
pub async fn seed_counseling(
    db: &DatabaseConnection,
    candidate_id: i64,
    status: &str,
    age_minutes: i64,
) -> counseling_record::Model {
    counseling_record::ActiveModel {
        candidate_id: Set(candidate_id),
        status: Set(status.to_string()),
        deleted_at: Set(None),
        created_at: Set(Utc::now().naive_utc() - Duration::minutes(age_minutes)),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert counseling record")
}

pub async fn seed_selected_candidate(
    db: &DatabaseConnection,
    full_name: &str,
    disability_type: Option<&str>,
) -> candidate::Model {
    let candidate = seed_candidate(db, full_name, disability_type).await;
    seed_counseling(db, candidate.id, "selected", 0).await;
    candidate
}
