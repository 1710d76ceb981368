//! Handlers for swipe submission and history.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/swipe` | Body: `{"target_id":"…","decision":"interested"}` |
//! | `GET`  | `/swipes/{target_id}/history` | The caller's writes on that target, oldest first |

use axum::{
  Json,
  extract::{Path, State},
};
use mutual_core::{
  Error,
  engine::MatchOutcome,
  store::SwipeStore,
  swipe::{Decision, SwipeEvent},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError, session::SessionActor};

// ─── Submit ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SwipeBody {
  pub target_id: Uuid,
  pub decision:  Decision,
}

/// `POST /swipe`
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  SessionActor(actor): SessionActor,
  Json(body): Json<SwipeBody>,
) -> Result<Json<MatchOutcome>, ApiError>
where
  S: SwipeStore + 'static,
{
  let outcome = state
    .engine
    .submit_swipe(actor.actor_id, body.target_id, body.decision)
    .await?;
  Ok(Json(outcome))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /swipes/{target_id}/history`
pub async fn history<S>(
  State(state): State<AppState<S>>,
  SessionActor(actor): SessionActor,
  Path(target_id): Path<Uuid>,
) -> Result<Json<Vec<SwipeEvent>>, ApiError>
where
  S: SwipeStore + 'static,
{
  let events = state
    .store()
    .swipe_history(actor.actor_id, target_id)
    .await
    .map_err(Error::from_store)?;
  Ok(Json(events))
}
