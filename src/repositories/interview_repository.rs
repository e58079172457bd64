use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
};

use crate::entities::mock_interview;

pub struct InterviewRepository;

impl InterviewRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        db: &C,
        id: i64,
    ) -> Result<Option<mock_interview::Model>, DbErr> {
        mock_interview::Entity::find_by_id(id)
            .filter(mock_interview::Column::DeletedAt.is_null())
            .one(db)
            .await
    }

    pub async fn list_by_batch<C: ConnectionTrait>(
        &self,
        db: &C,
        batch_id: i64,
    ) -> Result<Vec<mock_interview::Model>, DbErr> {
        mock_interview::Entity::find()
            .filter(mock_interview::Column::BatchId.eq(batch_id))
            .filter(mock_interview::Column::DeletedAt.is_null())
            .order_by_desc(mock_interview::Column::InterviewDate)
            .order_by_asc(mock_interview::Column::Id)
            .all(db)
            .await
    }

    pub async fn list_by_candidate<C: ConnectionTrait>(
        &self,
        db: &C,
        candidate_id: i64,
    ) -> Result<Vec<mock_interview::Model>, DbErr> {
        mock_interview::Entity::find()
            .filter(mock_interview::Column::CandidateId.eq(candidate_id))
            .filter(mock_interview::Column::DeletedAt.is_null())
            .order_by_desc(mock_interview::Column::InterviewDate)
            .order_by_asc(mock_interview::Column::Id)
            .all(db)
            .await
    }

    pub async fn insert<C: ConnectionTrait>(
        &self,
        db: &C,
        model: mock_interview::ActiveModel,
    ) -> Result<mock_interview::Model, DbErr> {
        model.insert(db).await
    }

    pub async fn update<C: ConnectionTrait>(
        &self,
        db: &C,
        model: mock_interview::ActiveModel,
    ) -> Result<mock_interview::Model, DbErr> {
        model.update(db).await
    }

    pub async fn soft_delete<C: ConnectionTrait>(&self, db: &C, id: i64) -> Result<bool, DbErr> {
        let now = Utc::now().naive_utc();
        let result = mock_interview::Entity::update_many()
            .col_expr(mock_interview::Column::DeletedAt, Expr::value(now))
            .col_expr(mock_interview::Column::UpdatedAt, Expr::value(now))
            .filter(mock_interview::Column::Id.eq(id))
            .filter(mock_interview::Column::DeletedAt.is_null())
            .exec(db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

impl Default for InterviewRepository {
    fn default() -> Self {
        Self::new()
    }
}
