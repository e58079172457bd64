use sea_orm_migration::prelude::*;

use super::m20251020_000001_create_table_candidate::Candidate;
use super::m20251020_000002_create_table_batch::Batch;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Assessments and assignments share one table, told apart by `kind`
        manager
            .create_table(
                Table::create()
                    .table(ScoredRecord::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScoredRecord::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ScoredRecord::ExternalId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ScoredRecord::Kind).string().not_null())
                    .col(ColumnDef::new(ScoredRecord::BatchId).big_integer().not_null())
                    .col(ColumnDef::new(ScoredRecord::CandidateId).big_integer().not_null())
                    .col(ColumnDef::new(ScoredRecord::Name).string().not_null())
                    .col(ColumnDef::new(ScoredRecord::TrainerId).uuid().null())
                    .col(
                        ColumnDef::new(ScoredRecord::MarksObtained)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(ScoredRecord::MaxMarks)
                            .double()
                            .not_null()
                            .default(100.0),
                    )
                    .col(ColumnDef::new(ScoredRecord::RecordDate).date().not_null())
                    .col(ColumnDef::new(ScoredRecord::SubmissionDate).date().null())
                    .col(ColumnDef::new(ScoredRecord::CourseMarks).json_binary().null())
                    .col(ColumnDef::new(ScoredRecord::DeletedAt).timestamp().null())
                    .col(
                        ColumnDef::new(ScoredRecord::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .col(
                        ColumnDef::new(ScoredRecord::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scored_record_batch")
                            .from_tbl(ScoredRecord::Table)
                            .from_col(ScoredRecord::BatchId)
                            .to_tbl(Batch::Table)
                            .to_col(Batch::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scored_record_candidate")
                            .from_tbl(ScoredRecord::Table)
                            .from_col(ScoredRecord::CandidateId)
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
                    .name("uq_scored_record_natural_key")
                    .table(ScoredRecord::Table)
                    .col(ScoredRecord::Kind)
                    .col(ScoredRecord::BatchId)
                    .col(ScoredRecord::CandidateId)
                    .col(ScoredRecord::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("uq_scored_record_natural_key")
                    .table(ScoredRecord::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(ScoredRecord::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum ScoredRecord {
    Table,
    Id,
    ExternalId,
    Kind,
    BatchId,
    CandidateId,
    Name,
    TrainerId,
    MarksObtained,
    MaxMarks,
    RecordDate,
    SubmissionDate,
    CourseMarks,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}
