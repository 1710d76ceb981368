//! Handlers for `/actors`, a minimal identity provider for development.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/actors` | Body: `{"role":"employer","display_name":"Acme"}` |
//! | `GET`  | `/actors/{id}` | 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use mutual_core::{
  Error,
  actor::{Actor, NewActor},
  store::SwipeStore,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// `POST /actors`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewActor>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SwipeStore + 'static,
{
  if body.display_name.trim().is_empty() {
    return Err(ApiError::BadRequest("display_name must not be empty".into()));
  }
  let actor = state
    .store()
    .register_actor(body)
    .await
    .map_err(Error::from_store)?;
  tracing::info!(actor = %actor.actor_id, role = %actor.role, "actor registered");
  Ok((StatusCode::CREATED, Json(actor)))
}

/// `GET /actors/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Actor>, ApiError>
where
  S: SwipeStore + 'static,
{
  let actor = state
    .store()
    .get_actor(id)
    .await
    .map_err(Error::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("actor {id} not found")))?;
  Ok(Json(actor))
}
