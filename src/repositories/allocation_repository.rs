use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::entities::allocation::{self, AllocationStatus};
use crate::entities::batch::{self, BatchStatus};

use super::SortOrder;

#[derive(Debug, Clone)]
pub struct AllocationListFilter {
    pub status: Option<AllocationStatus>,
    pub include_dropouts: bool,
    pub order: SortOrder,
}

impl Default for AllocationListFilter {
    fn default() -> Self {
        Self {
            status: None,
            include_dropouts: true,
            order: SortOrder::Asc,
        }
    }
}

pub struct AllocationRepository;

impl AllocationRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        db: &C,
        id: i64,
    ) -> Result<Option<allocation::Model>, DbErr> {
        allocation::Entity::find_by_id(id)
            .filter(allocation::Column::DeletedAt.is_null())
            .one(db)
            .await
    }

    pub async fn find_by_external_id<C: ConnectionTrait>(
        &self,
        db: &C,
        external_id: Uuid,
    ) -> Result<Option<allocation::Model>, DbErr> {
        allocation::Entity::find()
            .filter(allocation::Column::ExternalId.eq(external_id))
            .filter(allocation::Column::DeletedAt.is_null())
            .one(db)
            .await
    }

    pub async fn find_pair<C: ConnectionTrait>(
        &self,
        db: &C,
        batch_id: i64,
        candidate_id: i64,
    ) -> Result<Option<allocation::Model>, DbErr> {
        allocation::Entity::find()
            .filter(allocation::Column::BatchId.eq(batch_id))
            .filter(allocation::Column::CandidateId.eq(candidate_id))
            .filter(allocation::Column::DeletedAt.is_null())
            .one(db)
            .await
    }

    fn active_query() -> sea_orm::Select<allocation::Entity> {
        allocation::Entity::find()
            .inner_join(batch::Entity)
            .filter(allocation::Column::DeletedAt.is_null())
            .filter(allocation::Column::IsDropout.eq(false))
            .filter(batch::Column::DeletedAt.is_null())
            .filter(batch::Column::Status.is_in(BatchStatus::ACTIVE))
    }

    /// The candidate's allocation in a batch that is still planned, running or extended.
    pub async fn find_active_for_candidate<C: ConnectionTrait>(
        &self,
        db: &C,
        candidate_id: i64,
    ) -> Result<Option<allocation::Model>, DbErr> {
        Self::active_query()
            .filter(allocation::Column::CandidateId.eq(candidate_id))
            .one(db)
            .await
    }

    pub async fn active_candidate_ids<C: ConnectionTrait>(&self, db: &C) -> Result<Vec<i64>, DbErr> {
        Self::active_query()
            .select_only()
            .column(allocation::Column::CandidateId)
            .distinct()
            .into_tuple::<i64>()
            .all(db)
            .await
    }

    pub async fn list_by_batch<C: ConnectionTrait>(
        &self,
        db: &C,
        batch_id: i64,
        filter: &AllocationListFilter,
    ) -> Result<Vec<allocation::Model>, DbErr> {
        let mut query = allocation::Entity::find()
            .filter(allocation::Column::BatchId.eq(batch_id))
            .filter(allocation::Column::DeletedAt.is_null());

        if let Some(status) = filter.status {
            query = query.filter(allocation::Column::Status.eq(status));
        }

        if !filter.include_dropouts {
            query = query.filter(allocation::Column::IsDropout.eq(false));
        }

        query
            .order_by(allocation::Column::CreatedAt, filter.order.into())
            .order_by(allocation::Column::Id, filter.order.into())
            .all(db)
            .await
    }

    pub async fn list_by_candidate<C: ConnectionTrait>(
        &self,
        db: &C,
        candidate_id: i64,
    ) -> Result<Vec<allocation::Model>, DbErr> {
        allocation::Entity::find()
            .filter(allocation::Column::CandidateId.eq(candidate_id))
            .filter(allocation::Column::DeletedAt.is_null())
            .order_by_desc(allocation::Column::CreatedAt)
            .order_by_desc(allocation::Column::Id)
            .all(db)
            .await
    }

    /// Non-dropout allocations of a batch, the candidates for completion.
    pub async fn list_retained<C: ConnectionTrait>(
        &self,
        db: &C,
        batch_id: i64,
    ) -> Result<Vec<allocation::Model>, DbErr> {
        allocation::Entity::find()
            .filter(allocation::Column::BatchId.eq(batch_id))
            .filter(allocation::Column::IsDropout.eq(false))
            .filter(allocation::Column::DeletedAt.is_null())
            .order_by_asc(allocation::Column::Id)
            .all(db)
            .await
    }

    pub async fn insert<C: ConnectionTrait>(
        &self,
        db: &C,
        model: allocation::ActiveModel,
    ) -> Result<allocation::Model, DbErr> {
        model.insert(db).await
    }

    pub async fn update<C: ConnectionTrait>(
        &self,
        db: &C,
        model: allocation::ActiveModel,
    ) -> Result<allocation::Model, DbErr> {
        model.update(db).await
    }
}

impl Default for AllocationRepository {
    fn default() -> Self {
        Self::new()
    }
}
