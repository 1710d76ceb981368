//! `GET /analytics`: acceptance stats for the calling actor.

use axum::{Json, extract::State};
use mutual_core::{actor::Role, analytics::ActorStats, store::SwipeStore};
use serde::Serialize;

use crate::{AppState, error::ApiError, session::SessionActor};

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
  pub role:  Role,
  #[serde(flatten)]
  pub stats: ActorStats,
}

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  SessionActor(actor): SessionActor,
) -> Result<Json<AnalyticsResponse>, ApiError>
where
  S: SwipeStore + 'static,
{
  let stats = match actor.role {
    Role::Employer => state.analytics.employer_stats(actor.actor_id).await?,
    Role::Jobseeker => state.analytics.seeker_stats(actor.actor_id).await?,
  };
  Ok(Json(AnalyticsResponse { role: actor.role, stats }))
}
