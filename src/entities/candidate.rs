//! `SeaORM` Entity for candidate table
//!
//! Owned by the registration subsystem; this service only reads it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "candidate")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub external_id: Uuid,
    pub full_name: String,
    pub disability_type: Option<String>,
    pub deleted_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::counseling_record::Entity")]
    CounselingRecord,
    #[sea_orm(has_many = "super::allocation::Entity")]
    Allocation,
}

impl Related<super::counseling_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CounselingRecord.def()
    }
}

impl Related<super::allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
