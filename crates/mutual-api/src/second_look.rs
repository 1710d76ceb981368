//! Handlers for the second-look flow.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/second-look` | The caller's open rejections |
//! | `POST` | `/match/{target_id}/update` | Body: `{"status":"matched"}` |

use axum::{
  Json,
  extract::{Path, State},
};
use mutual_core::{
  engine::MatchOutcome,
  record::MatchStatus,
  second_look::SecondLookCandidate,
  store::SwipeStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError, session::SessionActor};

/// `GET /second-look`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  SessionActor(actor): SessionActor,
) -> Result<Json<Vec<SecondLookCandidate>>, ApiError>
where
  S: SwipeStore + 'static,
{
  let candidates = state.second_look.candidates(actor.actor_id).await?;
  Ok(Json(candidates))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub status: MatchStatus,
}

/// `POST /match/{target_id}/update`
///
/// Only `matched` is accepted. It revises the caller's rejection into
/// interest; whether the pair actually matches still depends on the other
/// side.
pub async fn update<S>(
  State(state): State<AppState<S>>,
  SessionActor(actor): SessionActor,
  Path(target_id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<MatchOutcome>, ApiError>
where
  S: SwipeStore + 'static,
{
  if body.status != MatchStatus::Matched {
    return Err(ApiError::BadRequest(format!(
      "status {} cannot be requested; only matched",
      body.status
    )));
  }
  let outcome = state
    .second_look
    .revise_swipe(actor.actor_id, target_id)
    .await?;
  Ok(Json(outcome))
}
