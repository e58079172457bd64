use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::batch::{self, BatchStatus};
use crate::entities::{allocation, batch_extension};

/// Batch reference as accepted from callers: external UUID or internal id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchRef {
    Id(i64),
    External(Uuid),
}

impl BatchRef {
    pub fn parse(raw: &str) -> Option<Self> {
        if let Ok(uuid) = Uuid::parse_str(raw) {
            return Some(Self::External(uuid));
        }
        raw.parse::<i64>().ok().map(Self::Id)
    }
}

impl std::fmt::Display for BatchRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchRef::Id(id) => write!(f, "{}", id),
            BatchRef::External(uuid) => write!(f, "{}", uuid),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BatchSortField {
    Name,
    StartDate,
    ApproxCloseDate,
    #[default]
    CreatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl From<SortOrder> for sea_orm::Order {
    fn from(value: SortOrder) -> Self {
        match value {
            SortOrder::Asc => sea_orm::Order::Asc,
            SortOrder::Desc => sea_orm::Order::Desc,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchFilter {
    pub search: Option<String>,
    pub status: Option<BatchStatus>,
    pub disability_tag: Option<String>,
    pub sort_by: BatchSortField,
    pub order: SortOrder,
}

pub struct BatchRepository;

impl BatchRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        db: &C,
        id: i64,
    ) -> Result<Option<batch::Model>, DbErr> {
        batch::Entity::find_by_id(id)
            .filter(batch::Column::DeletedAt.is_null())
            .one(db)
            .await
    }

    pub async fn find_by_external_id<C: ConnectionTrait>(
        &self,
        db: &C,
        external_id: Uuid,
    ) -> Result<Option<batch::Model>, DbErr> {
        batch::Entity::find()
            .filter(batch::Column::ExternalId.eq(external_id))
            .filter(batch::Column::DeletedAt.is_null())
            .one(db)
            .await
    }

    pub async fn resolve<C: ConnectionTrait>(
        &self,
        db: &C,
        batch_ref: BatchRef,
    ) -> Result<Option<batch::Model>, DbErr> {
        match batch_ref {
            BatchRef::Id(id) => self.find_by_id(db, id).await,
            BatchRef::External(uuid) => self.find_by_external_id(db, uuid).await,
        }
    }

    pub async fn find_all_with_pagination<C: ConnectionTrait>(
        &self,
        db: &C,
        filter: &BatchFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<batch::Model>, u64), DbErr> {
        let mut query = batch::Entity::find().filter(batch::Column::DeletedAt.is_null());

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(batch::Column::Name.contains(search));
        }

        if let Some(status) = filter.status {
            query = query.filter(batch::Column::Status.eq(status));
        }

        if let Some(tag) = filter
            .disability_tag
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
        {
            query = query.filter(batch::Column::DisabilityTags.contains(format!(",{},", tag)));
        }

        let total = query.clone().count(db).await?;

        let sort_column = match filter.sort_by {
            BatchSortField::Name => batch::Column::Name,
            BatchSortField::StartDate => batch::Column::StartDate,
            BatchSortField::ApproxCloseDate => batch::Column::ApproxCloseDate,
            BatchSortField::CreatedAt => batch::Column::CreatedAt,
        };

        let page = page.max(1);
        let batches = query
            .order_by(sort_column, filter.order.into())
            .order_by_asc(batch::Column::Id)
            .limit(page_size)
            .offset((page - 1) * page_size)
            .all(db)
            .await?;

        Ok((batches, total))
    }

    pub async fn insert<C: ConnectionTrait>(
        &self,
        db: &C,
        model: batch::ActiveModel,
    ) -> Result<batch::Model, DbErr> {
        model.insert(db).await
    }

    /// Flips planned to running. Returns false when another writer got there first
    /// or the batch was not planned.
    pub async fn mark_running_if_planned<C: ConnectionTrait>(
        &self,
        db: &C,
        batch_id: i64,
    ) -> Result<bool, DbErr> {
        let result = batch::Entity::update_many()
            .col_expr(batch::Column::Status, Expr::value(BatchStatus::Running))
            .col_expr(batch::Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
            .filter(batch::Column::Id.eq(batch_id))
            .filter(batch::Column::Status.eq(BatchStatus::Planned))
            .exec(db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Re-reads a live batch and holds a row lock on it until the transaction ends.
    /// SQLite ignores the lock clause; its single writer already serialises transactions.
    pub async fn lock_by_id<C: ConnectionTrait>(
        &self,
        db: &C,
        batch_id: i64,
    ) -> Result<Option<batch::Model>, DbErr> {
        batch::Entity::find_by_id(batch_id)
            .filter(batch::Column::DeletedAt.is_null())
            .lock_exclusive()
            .one(db)
            .await
    }

    /// Writes `to` only while the row still has status `from`.
    pub async fn transition_status<C: ConnectionTrait>(
        &self,
        db: &C,
        batch_id: i64,
        from: BatchStatus,
        to: BatchStatus,
    ) -> Result<bool, DbErr> {
        let result = batch::Entity::update_many()
            .col_expr(batch::Column::Status, Expr::value(to))
            .col_expr(batch::Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
            .filter(batch::Column::Id.eq(batch_id))
            .filter(batch::Column::Status.eq(from))
            .filter(batch::Column::DeletedAt.is_null())
            .exec(db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Moves the close date only if both the close date and the status are
    /// still the ones the caller read, and accumulates the extension days in
    /// the same statement.
    #[allow(clippy::too_many_arguments)]
    pub async fn apply_extension<C: ConnectionTrait>(
        &self,
        db: &C,
        batch_id: i64,
        expected_status: BatchStatus,
        expected_close_date: NaiveDate,
        new_close_date: NaiveDate,
        extension_days: i32,
        status: Option<BatchStatus>,
    ) -> Result<bool, DbErr> {
        let mut update = batch::Entity::update_many()
            .col_expr(batch::Column::ApproxCloseDate, Expr::value(new_close_date))
            .col_expr(
                batch::Column::TotalExtensionDays,
                Expr::col(batch::Column::TotalExtensionDays).add(extension_days),
            )
            .col_expr(batch::Column::UpdatedAt, Expr::value(Utc::now().naive_utc()));

        if let Some(status) = status {
            update = update.col_expr(batch::Column::Status, Expr::value(status));
        }

        let result = update
            .filter(batch::Column::Id.eq(batch_id))
            .filter(batch::Column::Status.eq(expected_status))
            .filter(batch::Column::ApproxCloseDate.eq(expected_close_date))
            .filter(batch::Column::DeletedAt.is_null())
            .exec(db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn insert_extension<C: ConnectionTrait>(
        &self,
        db: &C,
        model: batch_extension::ActiveModel,
    ) -> Result<batch_extension::Model, DbErr> {
        model.insert(db).await
    }

    pub async fn extensions_for<C: ConnectionTrait>(
        &self,
        db: &C,
        batch_id: i64,
    ) -> Result<Vec<batch_extension::Model>, DbErr> {
        batch_extension::Entity::find()
            .filter(batch_extension::Column::BatchId.eq(batch_id))
            .filter(batch_extension::Column::DeletedAt.is_null())
            .order_by_asc(batch_extension::Column::CreatedAt)
            .order_by_asc(batch_extension::Column::Id)
            .all(db)
            .await
    }

    pub async fn soft_delete<C: ConnectionTrait>(&self, db: &C, batch_id: i64) -> Result<(), DbErr> {
        let now = Utc::now().naive_utc();
        batch::Entity::update_many()
            .col_expr(batch::Column::DeletedAt, Expr::value(now))
            .col_expr(batch::Column::UpdatedAt, Expr::value(now))
            .filter(batch::Column::Id.eq(batch_id))
            .filter(batch::Column::DeletedAt.is_null())
            .exec(db)
            .await?;
        Ok(())
    }

    /// Clears the active-allocation guard of every allocation in the batch.
    pub async fn release_allocations<C: ConnectionTrait>(
        &self,
        db: &C,
        batch_id: i64,
    ) -> Result<u64, DbErr> {
        let result = allocation::Entity::update_many()
            .col_expr(
                allocation::Column::ActiveCandidateId,
                Expr::value(Option::<i64>::None),
            )
            .filter(allocation::Column::BatchId.eq(batch_id))
            .filter(allocation::Column::ActiveCandidateId.is_not_null())
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn find_by_status<C: ConnectionTrait>(
        &self,
        db: &C,
        status: BatchStatus,
    ) -> Result<Vec<batch::Model>, DbErr> {
        batch::Entity::find()
            .filter(batch::Column::Status.eq(status))
            .filter(batch::Column::DeletedAt.is_null())
            .order_by_asc(batch::Column::Id)
            .all(db)
            .await
    }
}

impl Default for BatchRepository {
    fn default() -> Self {
        Self::new()
    }
}
