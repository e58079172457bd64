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
                    .table(MockInterview::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MockInterview::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MockInterview::ExternalId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(MockInterview::BatchId).big_integer().not_null())
                    .col(ColumnDef::new(MockInterview::CandidateId).big_integer().not_null())
                    .col(ColumnDef::new(MockInterview::Interviewer).string().not_null())
                    .col(ColumnDef::new(MockInterview::InterviewDate).date().not_null())
                    .col(ColumnDef::new(MockInterview::Questions).json_binary().null())
                    .col(ColumnDef::new(MockInterview::Skills).json_binary().null())
                    .col(ColumnDef::new(MockInterview::Feedback).text().null())
                    .col(ColumnDef::new(MockInterview::Rating).integer().null())
                    .col(
                        ColumnDef::new(MockInterview::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(MockInterview::DeletedAt).timestamp().null())
                    .col(
                        ColumnDef::new(MockInterview::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .col(
                        ColumnDef::new(MockInterview::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_mock_interview_batch")
                            .from_tbl(MockInterview::Table)
                            .from_col(MockInterview::BatchId)
                            .to_tbl(Batch::Table)
                            .to_col(Batch::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_mock_interview_candidate")
                            .from_tbl(MockInterview::Table)
                            .from_col(MockInterview::CandidateId)
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
                    .name("idx_mock_interview_batch_id")
                    .table(MockInterview::Table)
                    .col(MockInterview::BatchId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MockInterview::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MockInterview {
    Table,
    Id,
    ExternalId,
    BatchId,
    CandidateId,
    Interviewer,
    InterviewDate,
    Questions,
    Skills,
    Feedback,
    Rating,
    Status,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}
