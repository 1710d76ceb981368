//! Acceptance analytics, computed on demand from the swipe history.
//!
//! Read-only. Counts come from two separate store reads, so they are
//! eventually consistent with concurrent swipes but only ever reflect
//! committed writes.

use std::{collections::HashSet, sync::Arc};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  actor::{Actor, Role},
  record::{MatchStatus, PairKey},
  store::SwipeStore,
  swipe::Decision,
};

/// How the other side has responded to one actor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActorStats {
  /// Inbound `Interested` swipes.
  pub interested_count:     u64,
  /// Inbound `NotInterested` swipes.
  pub not_interested_count: u64,
  /// Inbound `Interested` swipes this actor has not answered yet.
  pub pending_count:        u64,
  /// `interested / max(not_interested, 1)`; always finite.
  pub ratio:                f64,
}

impl ActorStats {
  pub fn from_counts(interested: u64, not_interested: u64, pending: u64) -> Self {
    Self {
      interested_count:     interested,
      not_interested_count: not_interested,
      pending_count:        pending,
      ratio:                interested as f64 / not_interested.max(1) as f64,
    }
  }
}

pub struct Analytics<S> {
  store: Arc<S>,
}

impl<S> Clone for Analytics<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: SwipeStore> Analytics<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// How job seekers have responded to `employer_id`.
  pub async fn employer_stats(&self, employer_id: Uuid) -> Result<ActorStats> {
    let actor = self.expect_role(employer_id, Role::Employer).await?;
    self.tally(&actor).await
  }

  /// How employers have responded to `jobseeker_id`.
  pub async fn seeker_stats(&self, jobseeker_id: Uuid) -> Result<ActorStats> {
    let actor = self.expect_role(jobseeker_id, Role::Jobseeker).await?;
    self.tally(&actor).await
  }

  /// Stats for any actor, whichever role it has.
  pub async fn actor_stats(&self, actor_id: Uuid) -> Result<(Role, ActorStats)> {
    let actor = self.resolve(actor_id).await?;
    Ok((actor.role, self.tally(&actor).await?))
  }

  async fn resolve(&self, actor_id: Uuid) -> Result<Actor> {
    self
      .store
      .get_actor(actor_id)
      .await
      .map_err(Error::from_store)?
      .ok_or(Error::UnknownActor(actor_id))
  }

  async fn expect_role(&self, actor_id: Uuid, role: Role) -> Result<Actor> {
    let actor = self.resolve(actor_id).await?;
    if actor.role != role {
      return Err(Error::InvalidActorTarget {
        actor:  actor_id,
        target: actor_id,
        reason: "stats requested for the wrong role",
      });
    }
    Ok(actor)
  }

  async fn tally(&self, actor: &Actor) -> Result<ActorStats> {
    let inbound = self
      .store
      .inbound_intents(actor.actor_id)
      .await
      .map_err(Error::from_store)?;
    let pending: HashSet<PairKey> = self
      .store
      .list_matches(actor.actor_id, Some(MatchStatus::Pending))
      .await
      .map_err(Error::from_store)?
      .into_iter()
      .map(|r| r.pair)
      .collect();

    let (mut interested, mut not_interested, mut waiting) = (0, 0, 0);
    for intent in &inbound {
      match intent.decision {
        Decision::Interested => {
          interested += 1;
          let pair =
            PairKey::from_side(actor.role, actor.actor_id, intent.actor_id);
          if pending.contains(&pair) {
            waiting += 1;
          }
        }
        Decision::NotInterested => not_interested += 1,
      }
    }

    tracing::debug!(
      actor = %actor.actor_id,
      interested,
      not_interested,
      pending = waiting,
      "tallied inbound swipes"
    );
    Ok(ActorStats::from_counts(interested, not_interested, waiting))
  }
}
