use sea_orm_migration::prelude::*;

use super::m20251020_000001_create_table_candidate::Candidate;
use super::m20251020_000002_create_table_batch::Batch;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Attendance::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Attendance::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Attendance::ExternalId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(Attendance::BatchId).big_integer().not_null())
                    .col(ColumnDef::new(Attendance::CandidateId).big_integer().not_null())
                    .col(ColumnDef::new(Attendance::Date).date().not_null())
                    .col(ColumnDef::new(Attendance::PeriodId).big_integer().null())
                    // 0 stands for the legacy full-day record without a period
                    .col(
                        ColumnDef::new(Attendance::PeriodKey)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Attendance::Status).string().not_null())
                    .col(ColumnDef::new(Attendance::Remarks).text().null())
                    .col(ColumnDef::new(Attendance::TrainerNotes).text().null())
                    .col(ColumnDef::new(Attendance::DeletedAt).timestamp().null())
                    .col(
                        ColumnDef::new(Attendance::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .col(
                        ColumnDef::new(Attendance::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendance_batch")
                            .from_tbl(Attendance::Table)
                            .from_col(Attendance::BatchId)
                            .to_tbl(Batch::Table)
                            .to_col(Batch::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendance_candidate")
                            .from_tbl(Attendance::Table)
                            .from_col(Attendance::CandidateId)
                            .to_tbl(Candidate::Table)
                            .to_col(Candidate::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_attendance_natural_key")
                    .table(Attendance::Table)
                    .col(Attendance::BatchId)
                    .col(Attendance::CandidateId)
                    .col(Attendance::Date)
                    .col(Attendance::PeriodKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_attendance_candidate_id")
                    .table(Attendance::Table)
                    .col(Attendance::CandidateId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("uq_attendance_natural_key")
                    .table(Attendance::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Attendance::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Attendance {
    Table,
    Id,
    ExternalId,
    BatchId,
    CandidateId,
    Date,
    PeriodId,
    PeriodKey,
    Status,
    Remarks,
    TrainerNotes,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}
