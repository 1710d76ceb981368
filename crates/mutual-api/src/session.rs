//! The `x-actor-id` session extractor.

use axum::{extract::FromRequestParts, http::request::Parts};
use mutual_core::{actor::Actor, store::SwipeStore};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// Header carrying the calling actor's id.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// The resolved actor making the request. Rejects with 401 when the header
/// is missing, malformed or names nobody.
#[derive(Debug, Clone)]
pub struct SessionActor(pub Actor);

/// Parse the actor id out of the request headers.
pub fn actor_id(parts: &Parts) -> Result<Uuid, ApiError> {
  let raw = parts
    .headers
    .get(ACTOR_HEADER)
    .and_then(|v| v.to_str().ok())
    .ok_or_else(|| ApiError::Unauthorized(format!("missing {ACTOR_HEADER} header")))?;
  Uuid::parse_str(raw.trim())
    .map_err(|_| ApiError::Unauthorized(format!("malformed {ACTOR_HEADER} header")))
}

impl<S> FromRequestParts<AppState<S>> for SessionActor
where
  S: SwipeStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let id = actor_id(parts)?;
    let actor = state.engine.actor(id).await?;
    Ok(SessionActor(actor))
  }
}
