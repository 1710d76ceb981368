//! [`MatchEngine`]: the entry point for swipes.
//!
//! Resolves both parties through the [`crate::store::Directory`], validates
//! the pairing, commits through the store and notifies on genuine new
//! matches. The notifier runs after the store commit returns, never inside it.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
  Error, Result,
  actor::Actor,
  record::{MatchRecord, MatchStatus},
  store::{SwipeCommit, SwipeStore},
  swipe::{Decision, NewSwipe, SwipeIntent},
};

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// What a swipe did to its pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchOutcome {
  pub status:  MatchStatus,
  /// `true` only when the status actually moved (including record creation).
  pub changed: bool,
  pub record:  MatchRecord,
  pub intent:  SwipeIntent,
}

impl MatchOutcome {
  /// `true` exactly once per pair: on the swipe that completed the match.
  pub fn is_new_match(&self) -> bool {
    self.changed && self.status == MatchStatus::Matched
  }
}

impl From<SwipeCommit> for MatchOutcome {
  fn from(commit: SwipeCommit) -> Self {
    Self {
      status:  commit.record.status,
      changed: commit.changed(),
      record:  commit.record,
      intent:  commit.intent,
    }
  }
}

// ─── Notification ────────────────────────────────────────────────────────────

/// Sink for confirmed matches (push notifications, chat provisioning, ...).
pub trait MatchNotifier: Send + Sync {
  fn matched(&self, record: &MatchRecord);
}

/// Logs each new match.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl MatchNotifier for LogNotifier {
  fn matched(&self, record: &MatchRecord) {
    tracing::info!(
      jobseeker = %record.pair.jobseeker_id,
      employer = %record.pair.employer_id,
      "match confirmed"
    );
  }
}

/// Forwards each new match to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier(pub mpsc::UnboundedSender<MatchRecord>);

impl ChannelNotifier {
  pub fn new() -> (Self, mpsc::UnboundedReceiver<MatchRecord>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self(tx), rx)
  }
}

impl MatchNotifier for ChannelNotifier {
  fn matched(&self, record: &MatchRecord) {
    if self.0.send(record.clone()).is_err() {
      tracing::warn!(pair = %record.pair, "match notification dropped: receiver closed");
    }
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

pub struct MatchEngine<S> {
  store:    Arc<S>,
  notifier: Arc<dyn MatchNotifier>,
}

impl<S> Clone for MatchEngine<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), notifier: self.notifier.clone() }
  }
}

impl<S: SwipeStore> MatchEngine<S> {
  /// An engine that logs new matches.
  pub fn new(store: Arc<S>) -> Self {
    Self { store, notifier: Arc::new(LogNotifier) }
  }

  pub fn with_notifier(mut self, notifier: Arc<dyn MatchNotifier>) -> Self {
    self.notifier = notifier;
    self
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Resolve an actor id, failing with [`Error::UnknownActor`].
  pub async fn actor(&self, actor_id: Uuid) -> Result<Actor> {
    self
      .store
      .get_actor(actor_id)
      .await
      .map_err(Error::from_store)?
      .ok_or(Error::UnknownActor(actor_id))
  }

  /// Resolve both parties of a swipe.
  pub async fn resolve_pair(
    &self,
    actor_id: Uuid,
    target_id: Uuid,
  ) -> Result<(Actor, Actor)> {
    let actor = self.actor(actor_id).await?;
    let target = self
      .store
      .get_actor(target_id)
      .await
      .map_err(Error::from_store)?
      .ok_or(Error::UnknownTarget(target_id))?;
    Ok((actor, target))
  }

  /// Record `actor_id`'s decision about `target_id` and settle the pair.
  pub async fn submit_swipe(
    &self,
    actor_id: Uuid,
    target_id: Uuid,
    decision: Decision,
  ) -> Result<MatchOutcome> {
    let (actor, target) = self.resolve_pair(actor_id, target_id).await?;
    self.submit_resolved(&actor, &target, decision).await
  }

  pub(crate) async fn submit_resolved(
    &self,
    actor: &Actor,
    target: &Actor,
    decision: Decision,
  ) -> Result<MatchOutcome> {
    let swipe = NewSwipe::new(actor, target, decision)?;
    let pair = swipe.pair();

    let commit = match self.store.record_swipe(swipe).await.map_err(Error::from_store) {
      Ok(commit) => commit,
      Err(e) if e.is_retryable() => {
        tracing::warn!(%pair, "swipe lost a race; caller should retry");
        return Err(e);
      }
      Err(e) => return Err(e),
    };

    let outcome = MatchOutcome::from(commit);
    tracing::debug!(
      %pair,
      actor = %actor.actor_id,
      %decision,
      revision = outcome.intent.revision,
      status = %outcome.status,
      "swipe committed"
    );

    if outcome.changed {
      tracing::info!(%pair, status = %outcome.status, "pair transitioned");
    }
    if outcome.is_new_match() {
      self.notifier.matched(&outcome.record);
    }
    Ok(outcome)
  }
}
