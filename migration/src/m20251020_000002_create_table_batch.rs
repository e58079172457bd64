use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Batch::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Batch::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Batch::ExternalId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(Batch::Name).string().not_null())
                    .col(
                        ColumnDef::new(Batch::DisabilityTags)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Batch::StartDate).date().not_null())
                    .col(ColumnDef::new(Batch::ApproxCloseDate).date().not_null())
                    .col(
                        ColumnDef::new(Batch::TotalExtensionDays)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Batch::Courses).json_binary().null())
                    .col(
                        ColumnDef::new(Batch::Status)
                            .string()
                            .not_null()
                            .default("planned"),
                    )
                    .col(ColumnDef::new(Batch::DeletedAt).timestamp().null())
                    .col(
                        ColumnDef::new(Batch::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .col(
                        ColumnDef::new(Batch::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_batch_status")
                    .table(Batch::Table)
                    .col(Batch::Status)
                    .to_owned(),
            )
            .await?;

        // Extension history is append-only
        manager
            .create_table(
                Table::create()
                    .table(BatchExtension::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BatchExtension::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BatchExtension::ExternalId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(BatchExtension::BatchId).big_integer().not_null())
                    .col(ColumnDef::new(BatchExtension::PreviousCloseDate).date().not_null())
                    .col(ColumnDef::new(BatchExtension::NewCloseDate).date().not_null())
                    .col(ColumnDef::new(BatchExtension::ExtensionDays).integer().not_null())
                    .col(ColumnDef::new(BatchExtension::Reason).text().null())
                    .col(ColumnDef::new(BatchExtension::DeletedAt).timestamp().null())
                    .col(
                        ColumnDef::new(BatchExtension::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .col(
                        ColumnDef::new(BatchExtension::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_batch_extension_batch")
                            .from_tbl(BatchExtension::Table)
                            .from_col(BatchExtension::BatchId)
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
                    .name("idx_batch_extension_batch_id")
                    .table(BatchExtension::Table)
                    .col(BatchExtension::BatchId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BatchExtension::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Batch::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Batch {
    Table,
    Id,
    ExternalId,
    Name,
    DisabilityTags,
    StartDate,
    ApproxCloseDate,
    TotalExtensionDays,
    Courses,
    Status,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum BatchExtension {
    Table,
    Id,
    ExternalId,
    BatchId,
    PreviousCloseDate,
    NewCloseDate,
    ExtensionDays,
    Reason,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}
