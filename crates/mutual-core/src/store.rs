//! The storage traits and the commit type they return.
//!
//! Implemented by `MemoryStore` (in this crate) and `mutual-store-sqlite`.
//! The engine services depend on these abstractions only.

use std::future::Future;

use uuid::Uuid;

use crate::{
  actor::{Actor, NewActor},
  machine::Transition,
  record::{MatchRecord, MatchStatus, PairKey},
  second_look::SecondLookCandidate,
  swipe::{NewSwipe, SwipeEvent, SwipeIntent},
};

// ─── Commit ──────────────────────────────────────────────────────────────────

/// Everything produced by one atomic swipe write.
#[derive(Debug, Clone)]
pub struct SwipeCommit {
  pub intent:     SwipeIntent,
  pub transition: Transition,
  /// The record as stored after the write.
  pub record:     MatchRecord,
}

impl SwipeCommit {
  pub fn changed(&self) -> bool { self.transition.changed() }
}

// ─── Directory ───────────────────────────────────────────────────────────────

/// Resolves actor ids to roles. Stands in for the external identity and
/// profile provider.
pub trait Directory: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  fn register_actor(
    &self,
    input: NewActor,
  ) -> impl Future<Output = Result<Actor, Self::Error>> + Send + '_;

  /// Register an actor under a caller-supplied id, e.g. one minted by the
  /// upstream identity provider. Fails if the id is taken.
  fn register_actor_with_id(
    &self,
    id: Uuid,
    input: NewActor,
  ) -> impl Future<Output = Result<Actor, Self::Error>> + Send + '_;

  /// Returns `None` if the id is unknown.
  fn get_actor(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Actor>, Self::Error>> + Send + '_;
}

// ─── SwipeStore ──────────────────────────────────────────────────────────────

/// Durable record of swipe intents and the match records derived from them.
///
/// The only write is [`SwipeStore::record_swipe`]. It upserts the intent and,
/// in the same atomic unit, re-derives the pair's record with
/// [`crate::machine::settle`]. There is no way to set a match
/// status directly.
pub trait SwipeStore: Directory {
  /// Upsert the intent described by `swipe` and settle the pair.
  ///
  /// Concurrent calls on the same pair are serialised; calls on different
  /// pairs are independent wherever the backend allows it. A backend that
  /// detects a lost race returns an error converting to
  /// [`crate::Error::Conflict`].
  fn record_swipe(
    &self,
    swipe: NewSwipe,
  ) -> impl Future<Output = Result<SwipeCommit, Self::Error>> + Send + '_;

  /// The latest intent of `actor_id` toward `target_id`, if any.
  fn get_intent(
    &self,
    actor_id: Uuid,
    target_id: Uuid,
  ) -> impl Future<Output = Result<Option<SwipeIntent>, Self::Error>> + Send + '_;

  /// The latest intent of `target_id` toward `actor_id`, the other half of
  /// the pair as seen from `actor_id`.
  fn get_counterpart_intent(
    &self,
    target_id: Uuid,
    actor_id: Uuid,
  ) -> impl Future<Output = Result<Option<SwipeIntent>, Self::Error>> + Send + '_
  {
    self.get_intent(target_id, actor_id)
  }

  fn get_match(
    &self,
    pair: PairKey,
  ) -> impl Future<Output = Result<Option<MatchRecord>, Self::Error>> + Send + '_;

  /// All records the actor takes part in, optionally filtered by status.
  fn list_matches(
    &self,
    actor_id: Uuid,
    status: Option<MatchStatus>,
  ) -> impl Future<Output = Result<Vec<MatchRecord>, Self::Error>> + Send + '_;

  /// One page of second-look candidates for `actor_id`, ordered by target id
  /// and starting strictly after `after`.
  fn reconsiderable_page(
    &self,
    actor_id: Uuid,
    after: Option<Uuid>,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<SecondLookCandidate>, Self::Error>> + Send + '_;

  /// Every latest intent whose target is `target_id`.
  fn inbound_intents(
    &self,
    target_id: Uuid,
  ) -> impl Future<Output = Result<Vec<SwipeIntent>, Self::Error>> + Send + '_;

  /// Every accepted write of `actor_id` toward `target_id`, oldest first.
  fn swipe_history(
    &self,
    actor_id: Uuid,
    target_id: Uuid,
  ) -> impl Future<Output = Result<Vec<SwipeEvent>, Self::Error>> + Send + '_;
}
