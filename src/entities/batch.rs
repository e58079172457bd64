//! `SeaORM` Entity for batch table

use sea_orm::{entity::prelude::*, sea_query::StringLen};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle of a training batch.
///
/// `Extended` is an overlay on a running batch rather than a terminal state;
/// every other move is forward-only.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    #[sea_orm(string_value = "planned")]
    Planned,
    #[sea_orm(string_value = "running")]
    Running,
    #[sea_orm(string_value = "extended")]
    Extended,
    #[sea_orm(string_value = "closed")]
    Closed,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl BatchStatus {
    pub const ACTIVE: [BatchStatus; 3] = [Self::Planned, Self::Running, Self::Extended];

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    pub fn can_transition_to(self, next: BatchStatus) -> bool {
        use BatchStatus::*;

        match (self, next) {
            (current, next) if current == next => true,
            (Planned, _) => true,
            (Running | Extended, Running | Extended | Closed | Completed) => true,
            (Closed, Completed) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BatchStatus::Planned => "planned",
            BatchStatus::Running => "running",
            BatchStatus::Extended => "extended",
            BatchStatus::Closed => "closed",
            BatchStatus::Completed => "completed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "batch")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub external_id: Uuid,
    pub name: String,
    /// Lowercase tags stored as `,tag,tag,` so a single tag can be matched with LIKE.
    pub disability_tags: String,
    pub start_date: Date,
    pub approx_close_date: Date,
    pub total_extension_days: i32,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub courses: Option<Json>,
    pub status: BatchStatus,
    pub deleted_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Model {
    pub fn tags(&self) -> Vec<String> {
        decode_tags(&self.disability_tags)
    }

    /// A batch without tags accepts every candidate.
    pub fn accepts_disability(&self, disability_type: Option<&str>) -> bool {
        let tags = self.tags();
        if tags.is_empty() {
            return true;
        }

        match disability_type.map(str::trim) {
            Some(kind) if !kind.is_empty() => tags.iter().any(|tag| tag.eq_ignore_ascii_case(kind)),
            _ => false,
        }
    }
}

pub fn encode_tags<S: AsRef<str>>(tags: &[S]) -> String {
    let mut normalized: Vec<String> = tags
        .iter()
        .map(|tag| tag.as_ref().trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect();
    normalized.sort();
    normalized.dedup();

    if normalized.is_empty() {
        String::new()
    } else {
        format!(",{},", normalized.join(","))
    }
}

pub fn decode_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::allocation::Entity")]
    Allocation,
    #[sea_orm(has_many = "super::batch_extension::Entity")]
    BatchExtension,
    #[sea_orm(has_many = "super::batch_plan::Entity")]
    BatchPlan,
}

impl Related<super::allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocation.def()
    }
}

impl Related<super::batch_extension::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BatchExtension.def()
    }
}

impl Related<super::batch_plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BatchPlan.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_normalized_and_deduplicated() {
        let encoded = encode_tags(&["Visual", " hearing ", "visual", ""]);
        assert_eq!(encoded, ",hearing,visual,");
        assert_eq!(decode_tags(&encoded), vec!["hearing", "visual"]);
        assert_eq!(encode_tags::<&str>(&[]), "");
    }

    #[test]
    fn status_moves_forward_only() {
        use BatchStatus::*;

        assert!(Planned.can_transition_to(Running));
        assert!(Running.can_transition_to(Extended));
        assert!(Extended.can_transition_to(Running));
        assert!(Closed.can_transition_to(Completed));
        assert!(!Running.can_transition_to(Planned));
        assert!(!Closed.can_transition_to(Running));
        assert!(!Completed.can_transition_to(Closed));
    }
}
