//! The pair state machine.
//!
//! | from       | swipe (latest, other side)      | to        |
//! |------------|---------------------------------|-----------|
//! | any        | `Interested`, no answer         | `Pending` |
//! | any        | `Interested`, `Interested`      | `Matched` |
//! | any        | either side `NotInterested`     | `Rejected`|
//! | `Matched`  | anything                        | `Matched` |
//!
//! Everything here is pure: status is a function of the two latest intents,
//! with the single exception that `Matched` never leaves `Matched`.

use serde::{Deserialize, Serialize};

use crate::{record::MatchStatus, swipe::Decision};

/// The four states a pair can be in. `NoRecord` is the initial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairState {
  NoRecord,
  Pending,
  Matched,
  Rejected,
}

impl From<Option<MatchStatus>> for PairState {
  fn from(status: Option<MatchStatus>) -> Self {
    match status {
      None => Self::NoRecord,
      Some(MatchStatus::Pending) => Self::Pending,
      Some(MatchStatus::Matched) => Self::Matched,
      Some(MatchStatus::Rejected) => Self::Rejected,
    }
  }
}

impl From<MatchStatus> for PairState {
  fn from(status: MatchStatus) -> Self { Some(status).into() }
}

impl PairState {
  /// Pure derivation from both sides' latest decisions, ignoring history.
  pub fn derive(a: Option<Decision>, b: Option<Decision>) -> Self {
    match (a, b) {
      (None, None) => Self::NoRecord,
      (Some(latest), other) | (other, Some(latest)) => {
        derive_status(latest, other).into()
      }
    }
  }
}

/// Status of a pair in which one side has just decided `latest` and the other
/// side's latest decision is `counterpart`.
pub fn derive_status(
  latest: Decision,
  counterpart: Option<Decision>,
) -> MatchStatus {
  use Decision::*;
  match (latest, counterpart) {
    (Interested, Some(Interested)) => MatchStatus::Matched,
    (NotInterested, _) | (_, Some(NotInterested)) => MatchStatus::Rejected,
    (Interested, None) => MatchStatus::Pending,
  }
}

/// The result of applying one swipe to a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
  pub from:   PairState,
  pub status: MatchStatus,
}

impl Transition {
  /// `true` only for a genuine change, including the creation of the record.
  pub fn changed(&self) -> bool { self.from != PairState::from(self.status) }
}

/// The single authoritative transition function.
///
/// `prior` is the stored status before the swipe, `latest` the decision just
/// written and `counterpart` the other side's stored decision.
pub fn settle(
  prior: Option<MatchStatus>,
  latest: Decision,
  counterpart: Option<Decision>,
) -> Transition {
  let from = PairState::from(prior);
  let status = match from {
    PairState::Matched => MatchStatus::Matched,
    _ => derive_status(latest, counterpart),
  };
  Transition { from, status }
}
