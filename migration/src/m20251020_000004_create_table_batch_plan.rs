use sea_orm_migration::prelude::*;

use super::m20251020_000002_create_table_batch::Batch;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BatchPlan::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BatchPlan::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BatchPlan::ExternalId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(BatchPlan::BatchId).big_integer().not_null())
                    .col(ColumnDef::new(BatchPlan::Date).date().not_null())
                    .col(ColumnDef::new(BatchPlan::StartTime).time().not_null())
                    .col(ColumnDef::new(BatchPlan::EndTime).time().not_null())
                    .col(ColumnDef::new(BatchPlan::ActivityType).string().not_null())
                    .col(ColumnDef::new(BatchPlan::ActivityName).string().not_null())
                    .col(ColumnDef::new(BatchPlan::Trainer).string().null())
                    .col(ColumnDef::new(BatchPlan::Notes).text().null())
                    .col(ColumnDef::new(BatchPlan::DeletedAt).timestamp().null())
                    .col(
                        ColumnDef::new(BatchPlan::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .col(
                        ColumnDef::new(BatchPlan::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_batch_plan_batch")
                            .from_tbl(BatchPlan::Table)
                            .from_col(BatchPlan::BatchId)
                            .to_tbl(Batch::Table)
                            .to_col(Batch::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_batch_plan_batch_date")
                    .table(BatchPlan::Table)
                    .col(BatchPlan::BatchId)
                    .col(BatchPlan::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BatchEvent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BatchEvent::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BatchEvent::ExternalId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(BatchEvent::BatchId).big_integer().not_null())
                    .col(ColumnDef::new(BatchEvent::Date).date().not_null())
                    .col(ColumnDef::new(BatchEvent::EventType).string().not_null())
                    .col(ColumnDef::new(BatchEvent::Title).string().not_null())
                    .col(ColumnDef::new(BatchEvent::Description).text().null())
                    .col(ColumnDef::new(BatchEvent::DeletedAt).timestamp().null())
                    .col(
                        ColumnDef::new(BatchEvent::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .col(
                        ColumnDef::new(BatchEvent::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_batch_event_batch")
                            .from_tbl(BatchEvent::Table)
                            .from_col(BatchEvent::BatchId)
                            .to_tbl(Batch::Table)
                            .to_col(Batch::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_batch_event_batch_date")
                    .table(BatchEvent::Table)
                    .col(BatchEvent::BatchId)
                    .col(BatchEvent::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BatchEvent::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(BatchPlan::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum BatchPlan {
    Table,
    Id,
    ExternalId,
    BatchId,
    Date,
    StartTime,
    EndTime,
    ActivityType,
    ActivityName,
    Trainer,
    Notes,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum BatchEvent {
    Table,
    Id,
    ExternalId,
    BatchId,
    Date,
    EventType,
    Title,
    Description,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}
