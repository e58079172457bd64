//! `SeaORM` Entity for allocation table

use chrono::NaiveDateTime;
use sea_orm::{entity::prelude::*, sea_query::StringLen};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Column-level discriminant of [`AllocationState`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum AllocationStatus {
    #[sea_orm(string_value = "allocated")]
    Allocated,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "dropout")]
    Dropout,
}

/// Where a candidate stands inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "current", rename_all = "snake_case")]
pub enum AllocationState {
    Allocated,
    Completed {
        at: NaiveDateTime,
        /// Set when the completion was written by the backfill task.
        migrated: bool,
    },
    Dropout {
        remark: String,
    },
}

impl AllocationState {
    pub fn status(&self) -> AllocationStatus {
        match self {
            AllocationState::Allocated => AllocationStatus::Allocated,
            AllocationState::Completed { .. } => AllocationStatus::Completed,
            AllocationState::Dropout { .. } => AllocationStatus::Dropout,
        }
    }
}

/// One entry of the allocation's status audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusTransition {
    pub from: Option<AllocationStatus>,
    pub to: AllocationStatus,
    pub at: NaiveDateTime,
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "allocation")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub external_id: Uuid,
    pub batch_id: i64,
    pub candidate_id: i64,
    pub status: AllocationStatus,
    pub completed_at: Option<DateTime>,
    pub migrated: bool,
    #[sea_orm(column_type = "JsonBinary")]
    pub status_history: Json,
    pub is_dropout: bool,
    pub dropout_remark: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub extras: Option<Json>,
    /// Mirrors `candidate_id` while the allocation is active, NULL otherwise.
    /// Backed by a unique index.
    pub active_candidate_id: Option<i64>,
    pub deleted_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Model {
    pub fn state(&self) -> AllocationState {
        match self.status {
            AllocationStatus::Allocated => AllocationState::Allocated,
            AllocationStatus::Completed => AllocationState::Completed {
                at: self.completed_at.unwrap_or(self.updated_at),
                migrated: self.migrated,
            },
            AllocationStatus::Dropout => AllocationState::Dropout {
                remark: self.dropout_remark.clone().unwrap_or_default(),
            },
        }
    }

    pub fn history(&self) -> Vec<StatusTransition> {
        serde_json::from_value(self.status_history.clone()).unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::batch::Entity",
        from = "Column::BatchId",
        to = "super::batch::Column::Id"
    )]
    Batch,
    #[sea_orm(
        belongs_to = "super::candidate::Entity",
        from = "Column::CandidateId",
        to = "super::candidate::Column::Id"
    )]
    Candidate,
}

impl Related<super::batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batch.def()
    }
}

impl Related<super::candidate::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Candidate.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
