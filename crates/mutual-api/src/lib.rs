//! JSON REST API for Mutual.
//!
//! Exposes an axum [`Router`] backed by any [`mutual_core::store::SwipeStore`].
//! The calling actor is named by the `x-actor-id` header; verifying that
//! header is the job of whatever sits in front of this router.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", mutual_api::api_router(AppState::new(store.clone())))
//! ```

pub mod actors;
pub mod analytics;
pub mod error;
pub mod matches;
pub mod second_look;
pub mod session;
pub mod swipes;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use mutual_core::{
  analytics::Analytics,
  engine::{MatchEngine, MatchNotifier},
  second_look::SecondLook,
  store::SwipeStore,
};

pub use error::ApiError;
pub use session::SessionActor;

// ─── Application state ────────────────────────────────────────────────────────

/// The services shared by every handler.
pub struct AppState<S> {
  pub engine:      MatchEngine<S>,
  pub second_look: SecondLook<S>,
  pub analytics:   Analytics<S>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      engine:      self.engine.clone(),
      second_look: self.second_look.clone(),
      analytics:   self.analytics.clone(),
    }
  }
}

impl<S: SwipeStore + 'static> AppState<S> {
  /// Services over `store`, logging new matches.
  pub fn new(store: Arc<S>) -> Self { Self::from_engine(MatchEngine::new(store)) }

  /// Services over `store`, sending new matches to `notifier`.
  pub fn with_notifier(store: Arc<S>, notifier: Arc<dyn MatchNotifier>) -> Self {
    Self::from_engine(MatchEngine::new(store).with_notifier(notifier))
  }

  fn from_engine(engine: MatchEngine<S>) -> Self {
    Self {
      second_look: SecondLook::new(engine.clone()),
      analytics:   Analytics::new(engine.store().clone()),
      engine,
    }
  }

  pub fn store(&self) -> &Arc<S> { self.engine.store() }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router over `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: SwipeStore + 'static,
{
  Router::new()
    // Swipes
    .route("/swipe", post(swipes::submit::<S>))
    .route("/swipes/{target_id}/history", get(swipes::history::<S>))
    // Second look
    .route("/second-look", get(second_look::list::<S>))
    .route("/match/{target_id}/update", post(second_look::update::<S>))
    // Matches & analytics
    .route("/matches", get(matches::list::<S>))
    .route("/analytics", get(analytics::handler::<S>))
    // Actors
    .route("/actors", post(actors::create::<S>))
    .route("/actors/{id}", get(actors::get_one::<S>))
    .with_state(state)
}
