use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
};

use crate::entities::scored_record::{self, RecordKind};

pub struct ScoredRecordRepository;

impl ScoredRecordRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert<C: ConnectionTrait>(
        &self,
        db: &C,
        model: scored_record::ActiveModel,
    ) -> Result<scored_record::Model, DbErr> {
        model.insert(db).await
    }

    /// Inserts or overwrites the row sharing (kind, batch, candidate, name).
    pub async fn upsert<C: ConnectionTrait>(
        &self,
        db: &C,
        model: scored_record::ActiveModel,
        kind: RecordKind,
        batch_id: i64,
        candidate_id: i64,
        name: &str,
    ) -> Result<scored_record::Model, DbErr> {
        scored_record::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    scored_record::Column::Kind,
                    scored_record::Column::BatchId,
                    scored_record::Column::CandidateId,
                    scored_record::Column::Name,
                ])
                .update_columns([
                    scored_record::Column::TrainerId,
                    scored_record::Column::MarksObtained,
                    scored_record::Column::MaxMarks,
                    scored_record::Column::RecordDate,
                    scored_record::Column::SubmissionDate,
                    scored_record::Column::CourseMarks,
                    scored_record::Column::DeletedAt,
                    scored_record::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        self.find_by_natural_key(db, kind, batch_id, candidate_id, name)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("scored record after upsert".to_string()))
    }

    pub async fn find_by_natural_key<C: ConnectionTrait>(
        &self,
        db: &C,
        kind: RecordKind,
        batch_id: i64,
        candidate_id: i64,
        name: &str,
    ) -> Result<Option<scored_record::Model>, DbErr> {
        scored_record::Entity::find()
            .filter(scored_record::Column::Kind.eq(kind))
            .filter(scored_record::Column::BatchId.eq(batch_id))
            .filter(scored_record::Column::CandidateId.eq(candidate_id))
            .filter(scored_record::Column::Name.eq(name))
            .filter(scored_record::Column::DeletedAt.is_null())
            .one(db)
            .await
    }

    /// Like [`Self::find_by_natural_key`] but also sees soft-deleted rows,
    /// which still hold the unique key.
    pub async fn find_any_by_natural_key<C: ConnectionTrait>(
        &self,
        db: &C,
        kind: RecordKind,
        batch_id: i64,
        candidate_id: i64,
        name: &str,
    ) -> Result<Option<scored_record::Model>, DbErr> {
        scored_record::Entity::find()
            .filter(scored_record::Column::Kind.eq(kind))
            .filter(scored_record::Column::BatchId.eq(batch_id))
            .filter(scored_record::Column::CandidateId.eq(candidate_id))
            .filter(scored_record::Column::Name.eq(name))
            .one(db)
            .await
    }

    pub async fn list_by_batch<C: ConnectionTrait>(
        &self,
        db: &C,
        kind: RecordKind,
        batch_id: i64,
    ) -> Result<Vec<scored_record::Model>, DbErr> {
        scored_record::Entity::find()
            .filter(scored_record::Column::Kind.eq(kind))
            .filter(scored_record::Column::BatchId.eq(batch_id))
            .filter(scored_record::Column::DeletedAt.is_null())
            .order_by_asc(scored_record::Column::Name)
            .order_by_asc(scored_record::Column::CandidateId)
            .all(db)
            .await
    }

    /// Soft-deletes every live record with this name in the batch.
    pub async fn soft_delete_by_name<C: ConnectionTrait>(
        &self,
        db: &C,
        kind: RecordKind,
        batch_id: i64,
        name: &str,
    ) -> Result<u64, DbErr> {
        let now = Utc::now().naive_utc();
        let result = scored_record::Entity::update_many()
            .col_expr(scored_record::Column::DeletedAt, Expr::value(now))
            .col_expr(scored_record::Column::UpdatedAt, Expr::value(now))
            .filter(scored_record::Column::Kind.eq(kind))
            .filter(scored_record::Column::BatchId.eq(batch_id))
            .filter(scored_record::Column::Name.eq(name))
            .filter(scored_record::Column::DeletedAt.is_null())
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}

impl Default for ScoredRecordRepository {
    fn default() -> Self {
        Self::new()
    }
}
