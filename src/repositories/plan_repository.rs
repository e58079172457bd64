use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
};

use crate::entities::batch_plan::{self, COURSE_ACTIVITY};
use crate::entities::batch_event;

/// Schedule slots and calendar events of a batch.
pub struct PlanRepository;

impl PlanRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        db: &C,
        id: i64,
    ) -> Result<Option<batch_plan::Model>, DbErr> {
        batch_plan::Entity::find_by_id(id)
            .filter(batch_plan::Column::DeletedAt.is_null())
            .one(db)
            .await
    }

    /// Course slots of a batch sharing the date and activity name, optionally
    /// leaving one slot out (the one being edited).
    pub async fn course_slots_on<C: ConnectionTrait>(
        &self,
        db: &C,
        batch_id: i64,
        date: NaiveDate,
        activity_name: &str,
        exclude_id: Option<i64>,
    ) -> Result<Vec<batch_plan::Model>, DbErr> {
        let mut query = batch_plan::Entity::find()
            .filter(batch_plan::Column::BatchId.eq(batch_id))
            .filter(batch_plan::Column::Date.eq(date))
            .filter(batch_plan::Column::ActivityType.eq(COURSE_ACTIVITY))
            .filter(batch_plan::Column::ActivityName.eq(activity_name))
            .filter(batch_plan::Column::DeletedAt.is_null());

        if let Some(id) = exclude_id {
            query = query.filter(batch_plan::Column::Id.ne(id));
        }

        query.all(db).await
    }

    pub async fn list_range<C: ConnectionTrait>(
        &self,
        db: &C,
        batch_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<batch_plan::Model>, DbErr> {
        batch_plan::Entity::find()
            .filter(batch_plan::Column::BatchId.eq(batch_id))
            .filter(batch_plan::Column::Date.between(from, to))
            .filter(batch_plan::Column::DeletedAt.is_null())
            .order_by_asc(batch_plan::Column::Date)
            .order_by_asc(batch_plan::Column::StartTime)
            .order_by_asc(batch_plan::Column::Id)
            .all(db)
            .await
    }

    pub async fn list_all<C: ConnectionTrait>(
        &self,
        db: &C,
        batch_id: i64,
    ) -> Result<Vec<batch_plan::Model>, DbErr> {
        batch_plan::Entity::find()
            .filter(batch_plan::Column::BatchId.eq(batch_id))
            .filter(batch_plan::Column::DeletedAt.is_null())
            .order_by_asc(batch_plan::Column::Date)
            .order_by_asc(batch_plan::Column::StartTime)
            .order_by_asc(batch_plan::Column::Id)
            .all(db)
            .await
    }

    pub async fn insert<C: ConnectionTrait>(
        &self,
        db: &C,
        model: batch_plan::ActiveModel,
    ) -> Result<batch_plan::Model, DbErr> {
        model.insert(db).await
    }

    pub async fn update<C: ConnectionTrait>(
        &self,
        db: &C,
        model: batch_plan::ActiveModel,
    ) -> Result<batch_plan::Model, DbErr> {
        model.update(db).await
    }

    pub async fn soft_delete<C: ConnectionTrait>(&self, db: &C, id: i64) -> Result<bool, DbErr> {
        let now = Utc::now().naive_utc();
        let result = batch_plan::Entity::update_many()
            .col_expr(batch_plan::Column::DeletedAt, Expr::value(now))
            .col_expr(batch_plan::Column::UpdatedAt, Expr::value(now))
            .filter(batch_plan::Column::Id.eq(id))
            .filter(batch_plan::Column::DeletedAt.is_null())
            .exec(db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn find_event<C: ConnectionTrait>(
        &self,
        db: &C,
        id: i64,
    ) -> Result<Option<batch_event::Model>, DbErr> {
        batch_event::Entity::find_by_id(id)
            .filter(batch_event::Column::DeletedAt.is_null())
            .one(db)
            .await
    }

    pub async fn events_for<C: ConnectionTrait>(
        &self,
        db: &C,
        batch_id: i64,
    ) -> Result<Vec<batch_event::Model>, DbErr> {
        batch_event::Entity::find()
            .filter(batch_event::Column::BatchId.eq(batch_id))
            .filter(batch_event::Column::DeletedAt.is_null())
            .order_by_asc(batch_event::Column::Date)
            .order_by_asc(batch_event::Column::Id)
            .all(db)
            .await
    }

    pub async fn insert_event<C: ConnectionTrait>(
        &self,
        db: &C,
        model: batch_event::ActiveModel,
    ) -> Result<batch_event::Model, DbErr> {
        model.insert(db).await
    }

    pub async fn soft_delete_event<C: ConnectionTrait>(
        &self,
        db: &C,
        id: i64,
    ) -> Result<bool, DbErr> {
        let now = Utc::now().naive_utc();
        let result = batch_event::Entity::update_many()
            .col_expr(batch_event::Column::DeletedAt, Expr::value(now))
            .col_expr(batch_event::Column::UpdatedAt, Expr::value(now))
            .filter(batch_event::Column::Id.eq(id))
            .filter(batch_event::Column::DeletedAt.is_null())
            .exec(db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

impl Default for PlanRepository {
    fn default() -> Self {
        Self::new()
    }
}
