//! Error types for `mutual-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::record::PairKey;

#[derive(Debug, Error)]
pub enum Error {
  /// The two ids cannot form a pair: same role, or the same actor twice.
  #[error("actor {actor} cannot swipe on {target}: {reason}")]
  InvalidActorTarget {
    actor:  Uuid,
    target: Uuid,
    reason: &'static str,
  },

  #[error("unknown actor: {0}")]
  UnknownActor(Uuid),

  #[error("unknown target: {0}")]
  UnknownTarget(Uuid),

  #[error("actor {actor} has no rejection of {target} open for a second look")]
  NotReconsiderable { actor: Uuid, target: Uuid },

  /// A concurrent writer won the race for this pair; retry the whole submit.
  #[error("concurrent write on pair {0}")]
  Conflict(PairKey),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Lift a backend error into the core error. Used as
  /// `.map_err(Error::from_store)?` at trait boundaries.
  pub fn from_store<E: Into<Error>>(e: E) -> Self { e.into() }

  /// Whether the caller should simply retry the operation.
  pub fn is_retryable(&self) -> bool { matches!(self, Self::Conflict(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
