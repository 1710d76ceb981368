//! `GET /matches[?status=pending|matched|rejected]`

use axum::{
  Json,
  extract::{Query, State},
};
use mutual_core::{
  Error,
  record::{MatchRecord, MatchStatus},
  store::SwipeStore,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError, session::SessionActor};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<MatchStatus>,
}

/// The caller's match records, most recently changed first.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  SessionActor(actor): SessionActor,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<MatchRecord>>, ApiError>
where
  S: SwipeStore + 'static,
{
  let records = state
    .store()
    .list_matches(actor.actor_id, params.status)
    .await
    .map_err(Error::from_store)?;
  Ok(Json(records))
}
