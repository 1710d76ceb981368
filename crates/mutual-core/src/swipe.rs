//! Swipe intents: one actor's unilateral decision about one target.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{
  Result,
  actor::{Actor, Role},
  record::PairKey,
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Decision {
  Interested,
  NotInterested,
}

impl Decision {
  pub fn is_interested(self) -> bool { matches!(self, Self::Interested) }
}

/// The latest decision of `actor_id` about `target_id`.
///
/// There is at most one intent per ordered `(actor_id, target_id)`; a later
/// swipe overwrites it and bumps `revision`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeIntent {
  pub actor_id:  Uuid,
  pub target_id: Uuid,
  pub decision:  Decision,
  /// Refreshed on every write, including identical re-submissions.
  pub swiped_at: DateTime<Utc>,
  /// Write counter for this ordered key, starting at 1.
  pub revision:  u64,
}

/// One accepted write, kept forever for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeEvent {
  pub actor_id:    Uuid,
  pub target_id:   Uuid,
  pub decision:    Decision,
  pub revision:    u64,
  pub recorded_at: DateTime<Utc>,
}

impl From<&SwipeIntent> for SwipeEvent {
  fn from(intent: &SwipeIntent) -> Self {
    Self {
      actor_id:    intent.actor_id,
      target_id:   intent.target_id,
      decision:    intent.decision,
      revision:    intent.revision,
      recorded_at: intent.swiped_at,
    }
  }
}

/// Input to [`crate::store::SwipeStore::record_swipe`].
///
/// Only constructible from two resolved actors of opposite roles, so a store
/// never sees a same-role or self swipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSwipe {
  pair:     PairKey,
  actor:    Role,
  decision: Decision,
}

impl NewSwipe {
  pub fn new(actor: &Actor, target: &Actor, decision: Decision) -> Result<Self> {
    let pair = PairKey::between(actor, target)?;
    Ok(Self { pair, actor: actor.role, decision })
  }

  pub fn pair(&self) -> PairKey { self.pair }

  pub fn decision(&self) -> Decision { self.decision }

  /// The side that is swiping.
  pub fn actor_role(&self) -> Role { self.actor }

  pub fn actor_id(&self) -> Uuid { self.pair.side(self.actor) }

  pub fn target_id(&self) -> Uuid { self.pair.side(self.actor.counterpart()) }
}
