use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Read model owned by the registration subsystem
        manager
            .create_table(
                Table::create()
                    .table(Candidate::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Candidate::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Candidate::ExternalId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Candidate::FullName).string().not_null())
                    .col(ColumnDef::new(Candidate::DisabilityType).string().null())
                    .col(ColumnDef::new(Candidate::DeletedAt).timestamp().null())
                    .col(
                        ColumnDef::new(Candidate::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .col(
                        ColumnDef::new(Candidate::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .to_owned(),
            )
            .await?;

        // Read model owned by the counseling subsystem
        manager
            .create_table(
                Table::create()
                    .table(CounselingRecord::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CounselingRecord::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CounselingRecord::CandidateId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CounselingRecord::Status).string().not_null())
                    .col(ColumnDef::new(CounselingRecord::DeletedAt).timestamp().null())
                    .col(
                        ColumnDef::new(CounselingRecord::CreatedAt)
                            .timestamp()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_string()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_counseling_record_candidate")
                            .from_tbl(CounselingRecord::Table)
                            .from_col(CounselingRecord::CandidateId)
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
                    .name("idx_counseling_record_candidate_id")
                    .table(CounselingRecord::Table)
                    .col(CounselingRecord::CandidateId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CounselingRecord::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Candidate::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Candidate {
    Table,
    Id,
    ExternalId,
    FullName,
    DisabilityType,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CounselingRecord {
    Table,
    Id,
    CandidateId,
    Status,
    DeletedAt,
    CreatedAt,
}
