use chrono::NaiveDate;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::attendance;

pub struct AttendanceRepository;

impl AttendanceRepository {
    pub fn new() -> Self {
        Self
    }

    /// Inserts or overwrites the row sharing (batch, candidate, date, period)
    /// and returns the stored row. The external id of an existing row is kept.
    pub async fn upsert<C: ConnectionTrait>(
        &self,
        db: &C,
        model: attendance::ActiveModel,
        batch_id: i64,
        candidate_id: i64,
        date: NaiveDate,
        period_key: i64,
    ) -> Result<attendance::Model, DbErr> {
        attendance::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    attendance::Column::BatchId,
                    attendance::Column::CandidateId,
                    attendance::Column::Date,
                    attendance::Column::PeriodKey,
                ])
                .update_columns([
                    attendance::Column::PeriodId,
                    attendance::Column::Status,
                    attendance::Column::Remarks,
                    attendance::Column::TrainerNotes,
                    attendance::Column::DeletedAt,
                    attendance::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        self.find_by_natural_key(db, batch_id, candidate_id, date, period_key)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("attendance after upsert".to_string()))
    }

    pub async fn find_by_natural_key<C: ConnectionTrait>(
        &self,
        db: &C,
        batch_id: i64,
        candidate_id: i64,
        date: NaiveDate,
        period_key: i64,
    ) -> Result<Option<attendance::Model>, DbErr> {
        attendance::Entity::find()
            .filter(attendance::Column::BatchId.eq(batch_id))
            .filter(attendance::Column::CandidateId.eq(candidate_id))
            .filter(attendance::Column::Date.eq(date))
            .filter(attendance::Column::PeriodKey.eq(period_key))
            .filter(attendance::Column::DeletedAt.is_null())
            .one(db)
            .await
    }

    pub async fn list_by_batch<C: ConnectionTrait>(
        &self,
        db: &C,
        batch_id: i64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<attendance::Model>, DbErr> {
        let mut query = attendance::Entity::find()
            .filter(attendance::Column::BatchId.eq(batch_id))
            .filter(attendance::Column::DeletedAt.is_null());

        if let Some(from) = from {
            query = query.filter(attendance::Column::Date.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(attendance::Column::Date.lte(to));
        }

        query
            .order_by_asc(attendance::Column::Date)
            .order_by_asc(attendance::Column::CandidateId)
            .order_by_asc(attendance::Column::PeriodKey)
            .all(db)
            .await
    }

    pub async fn list_by_candidate<C: ConnectionTrait>(
        &self,
        db: &C,
        candidate_id: i64,
        batch_id: Option<i64>,
    ) -> Result<Vec<attendance::Model>, DbErr> {
        let mut query = attendance::Entity::find()
            .filter(attendance::Column::CandidateId.eq(candidate_id))
            .filter(attendance::Column::DeletedAt.is_null());

        if let Some(batch_id) = batch_id {
            query = query.filter(attendance::Column::BatchId.eq(batch_id));
        }

        query
            .order_by_asc(attendance::Column::Date)
            .order_by_asc(attendance::Column::PeriodKey)
            .all(db)
            .await
    }
}

impl Default for AttendanceRepository {
    fn default() -> Self {
        Self::new()
    }
}
