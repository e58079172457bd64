//! `SeaORM` Entity for batch_plan table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const COURSE_ACTIVITY: &str = "course";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "batch_plan")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub external_id: Uuid,
    pub batch_id: i64,
    pub date: Date,
    pub start_time: Time,
    pub end_time: Time,
    pub activity_type: String,
    pub activity_name: String,
    pub trainer: Option<String>,
    pub notes: Option<String>,
    pub deleted_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Model {
    pub fn duration_seconds(&self) -> i64 {
        (self.end_time - self.start_time).num_seconds()
    }

    /// Whole minutes, truncated.
    pub fn duration_minutes(&self) -> i64 {
        self.duration_seconds() / 60
    }

    pub fn is_course(&self) -> bool {
        self.activity_type.eq_ignore_ascii_case(COURSE_ACTIVITY)
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
}

impl Related<super::batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batch.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
