pub use sea_orm_migration::prelude::*;

mod m20251020_000001_create_table_candidate;
mod m20251020_000002_create_table_batch;
mod m20251020_000003_create_table_allocation;
mod m20251020_000004_create_table_batch_plan;
mod m20251020_000005_create_table_attendance;
mod m20251020_000006_create_table_scored_record;
mod m20251020_000007_create_table_mock_interview;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251020_000001_create_table_candidate::Migration),
            Box::new(m20251020_000002_create_table_batch::Migration),
            Box::new(m20251020_000003_create_table_allocation::Migration),
            Box::new(m20251020_000004_create_table_batch_plan::Migration),
            Box::new(m20251020_000005_create_table_attendance::Migration),
            Box::new(m20251020_000006_create_table_scored_record::Migration),
            Box::new(m20251020_000007_create_table_mock_interview::Migration),
        ]
    }
}
