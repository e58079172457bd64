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
                    .table(Allocation::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Allocation::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Allocation::ExternalId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Allocation::BatchId).big_integer().not_null())
                    .col(ColumnDef::new(Allocation::CandidateId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Allocation::Status)
                            .string()
                            .not_null()
                            .default("allocated"),
                    )
                    .col(ColumnDef::new(Allocation::CompletedAt).timestamp().null())
                    .col(
                        ColumnDef::new(Allocation::Migrated)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Allocation::StatusHistory).json_binary().not_null())
                    .col(
                        ColumnDef::new(Allocation::IsDropout)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Allocation::DropoutRemark).text().null())
                    .col(ColumnDef::new(Allocation::Extras).json_binary().null())
                    .col(
                        ColumnDef::new(Allocation::ActiveCandidateId)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(Allocation::DeletedAt).timestamp().null())
                    .col(
                        ColumnDef::new(Allocation::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .col(
                        ColumnDef::new(Allocation::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_allocation_batch")
                            .from_tbl(Allocation::Table)
                            .from_col(Allocation::BatchId)
                            .to_tbl(Batch::Table)
                            .to_col(Batch::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_allocation_candidate")
                            .from_tbl(Allocation::Table)
                            .from_col(Allocation::CandidateId)
                            .to_tbl(Candidate::Table)
                            .to_col(Candidate::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one active allocation per candidate. NULLs never collide, so
        // dropouts, removed rows and rows of closed batches are unconstrained.
        manager
            .create_index(
                Index::create()
                    .name("uq_allocation_active_candidate")
                    .table(Allocation::Table)
                    .col(Allocation::ActiveCandidateId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // One live allocation per (batch, candidate). Partial so a removed
        // allocation does not block re-allocation; same syntax on Postgres and SQLite.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX uq_allocation_live_pair \
                 ON allocation (batch_id, candidate_id) WHERE deleted_at IS NULL",
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_allocation_batch_id")
                    .table(Allocation::Table)
                    .col(Allocation::BatchId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_allocation_candidate_id")
                    .table(Allocation::Table)
                    .col(Allocation::CandidateId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("uq_allocation_live_pair")
                    .table(Allocation::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("uq_allocation_active_candidate")
                    .table(Allocation::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Allocation::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Allocation {
    Table,
    Id,
    ExternalId,
    BatchId,
    CandidateId,
    Status,
    CompletedAt,
    Migrated,
    StatusHistory,
    IsDropout,
    DropoutRemark,
    Extras,
    ActiveCandidateId,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}
