use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{candidate, counseling_record};

pub const SELECTED_STATUS: &str = "selected";

/// Candidate reference as accepted from callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateRef {
    Id(i64),
    External(Uuid),
}

impl CandidateRef {
    pub fn parse(raw: &str) -> Option<Self> {
        if let Ok(uuid) = Uuid::parse_str(raw) {
            return Some(Self::External(uuid));
        }
        raw.parse::<i64>().ok().map(Self::Id)
    }
}

impl std::fmt::Display for CandidateRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateRef::Id(id) => write!(f, "{}", id),
            CandidateRef::External(uuid) => write!(f, "{}", uuid),
        }
    }
}

/// The slice of candidate data this service is allowed to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateProfile {
    pub id: i64,
    pub external_id: Uuid,
    pub full_name: String,
    pub disability_type: Option<String>,
    pub counseling_status: Option<String>,
}

impl CandidateProfile {
    fn from_model(model: candidate::Model, counseling_status: Option<String>) -> Self {
        Self {
            id: model.id,
            external_id: model.external_id,
            full_name: model.full_name,
            disability_type: model.disability_type,
            counseling_status,
        }
    }

    pub fn is_selected(&self) -> bool {
        self.counseling_status
            .as_deref()
            .is_some_and(|status| status.trim().eq_ignore_ascii_case(SELECTED_STATUS))
    }
}

/// Read-only view over the candidate and counseling tables.
pub struct CandidateDirectory;

impl CandidateDirectory {
    pub fn new() -> Self {
        Self
    }

    pub async fn find<C: ConnectionTrait>(
        &self,
        db: &C,
        candidate_ref: CandidateRef,
    ) -> Result<Option<CandidateProfile>, DbErr> {
        let query = candidate::Entity::find().filter(candidate::Column::DeletedAt.is_null());
        let query = match candidate_ref {
            CandidateRef::Id(id) => query.filter(candidate::Column::Id.eq(id)),
            CandidateRef::External(uuid) => query.filter(candidate::Column::ExternalId.eq(uuid)),
        };

        let Some(model) = query.one(db).await? else {
            return Ok(None);
        };

        let status = self.latest_counseling_status(db, model.id).await?;
        Ok(Some(CandidateProfile::from_model(model, status)))
    }

    pub async fn latest_counseling_status<C: ConnectionTrait>(
        &self,
        db: &C,
        candidate_id: i64,
    ) -> Result<Option<String>, DbErr> {
        let record = counseling_record::Entity::find()
            .filter(counseling_record::Column::CandidateId.eq(candidate_id))
            .filter(counseling_record::Column::DeletedAt.is_null())
            .order_by_desc(counseling_record::Column::CreatedAt)
            .order_by_desc(counseling_record::Column::Id)
            .one(db)
            .await?;
        Ok(record.map(|r| r.status))
    }

    /// Candidates whose most recent counseling outcome is "selected".
    pub async fn selected_candidates<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> Result<Vec<CandidateProfile>, DbErr> {
        let records = counseling_record::Entity::find()
            .filter(counseling_record::Column::DeletedAt.is_null())
            .order_by_asc(counseling_record::Column::CandidateId)
            .order_by_desc(counseling_record::Column::CreatedAt)
            .order_by_desc(counseling_record::Column::Id)
            .all(db)
            .await?;

        let mut latest: HashMap<i64, String> = HashMap::new();
        for record in records {
            latest.entry(record.candidate_id).or_insert(record.status);
        }

        let selected_ids: Vec<i64> = latest
            .iter()
            .filter(|(_, status)| status.trim().eq_ignore_ascii_case(SELECTED_STATUS))
            .map(|(id, _)| *id)
            .collect();

        if selected_ids.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = candidate::Entity::find()
            .filter(candidate::Column::Id.is_in(selected_ids))
            .filter(candidate::Column::DeletedAt.is_null())
            .order_by_asc(candidate::Column::Id)
            .all(db)
            .await?;

        Ok(candidates
            .into_iter()
            .map(|model| {
                let status = latest.get(&model.id).cloned();
                CandidateProfile::from_model(model, status)
            })
            .collect())
    }
}

impl Default for CandidateDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_and_uuid_refs() {
        assert_eq!(CandidateRef::parse("12"), Some(CandidateRef::Id(12)));
        let uuid = Uuid::new_v4();
        assert_eq!(
            CandidateRef::parse(&uuid.to_string()),
            Some(CandidateRef::External(uuid))
        );
        assert_eq!(CandidateRef::parse("not-an-id"), None);
    }
}
