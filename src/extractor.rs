use axum::extract::FromRequestParts;
use http::request::Parts;

use crate::audit::Actor;
use crate::routes::error::ApiError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Caller identity forwarded by the gateway, which has already authenticated it.
pub struct CurrentActor(pub Actor);

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let id = header(ACTOR_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {ACTOR_ID_HEADER} header")))?;
        let role = header(ACTOR_ROLE_HEADER);

        Ok(CurrentActor(Actor::new(id, role)))
    }
}
