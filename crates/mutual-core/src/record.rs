//! Pair keys and match records.
//!
//! A [`MatchRecord`] is never written directly. Its status is re-derived from
//! the two sides' latest intents every time either side swipes (see
//! [`crate::machine`]), and the row is kept forever once created.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{
  Error, Result,
  actor::{Actor, Role},
};

// ─── PairKey ─────────────────────────────────────────────────────────────────

/// The unordered pair `{jobseeker, employer}`, stored canonically by role so
/// that `A→B` and `B→A` map to the same key.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
pub struct PairKey {
  pub jobseeker_id: Uuid,
  pub employer_id:  Uuid,
}

impl PairKey {
  pub fn new(jobseeker_id: Uuid, employer_id: Uuid) -> Self {
    Self { jobseeker_id, employer_id }
  }

  /// Build the key for a swipe from `actor` toward `target`.
  pub fn between(actor: &Actor, target: &Actor) -> Result<Self> {
    if actor.actor_id == target.actor_id {
      return Err(Error::InvalidActorTarget {
        actor:  actor.actor_id,
        target: target.actor_id,
        reason: "an actor cannot swipe on itself",
      });
    }
    if actor.role == target.role {
      return Err(Error::InvalidActorTarget {
        actor:  actor.actor_id,
        target: target.actor_id,
        reason: "both actors have the same role",
      });
    }
    Ok(Self::from_side(actor.role, actor.actor_id, target.actor_id))
  }

  /// The key for the pair in which `id` plays `role` and `other` plays the
  /// opposite role.
  pub fn from_side(role: Role, id: Uuid, other: Uuid) -> Self {
    match role {
      Role::Jobseeker => Self::new(id, other),
      Role::Employer => Self::new(other, id),
    }
  }

  /// The id sitting on the given side of the pair.
  pub fn side(&self, role: Role) -> Uuid {
    match role {
      Role::Jobseeker => self.jobseeker_id,
      Role::Employer => self.employer_id,
    }
  }
}

impl fmt::Display for PairKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.jobseeker_id, self.employer_id)
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchStatus {
  /// One side is interested, the other has not answered.
  Pending,
  /// Both sides are interested. Sticky.
  Matched,
  /// At least one side is not interested.
  Rejected,
}

// ─── MatchRecord ─────────────────────────────────────────────────────────────

/// The canonical, derived state of a pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
  pub pair:       PairKey,
  pub status:     MatchStatus,
  /// Bumped on every status change; used for optimistic concurrency.
  pub version:    u64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl MatchRecord {
  pub fn is_matched(&self) -> bool { self.status == MatchStatus::Matched }
}
