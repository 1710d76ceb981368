//! Actors, the two parties of every pair.
//!
//! Identity and profile data belong to an external directory; the engine only
//! needs the id and the role tag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// The closed set of roles. Match semantics are role-symmetric; the role is
/// consulted only to validate that a swipe crosses sides.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Jobseeker,
  Employer,
}

impl Role {
  /// The role on the other side of a pair.
  pub fn counterpart(self) -> Self {
    match self {
      Self::Jobseeker => Self::Employer,
      Self::Employer => Self::Jobseeker,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub actor_id:     Uuid,
  pub role:         Role,
  pub display_name: String,
  pub created_at:   DateTime<Utc>,
}

/// Input to [`crate::store::Directory::register_actor`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewActor {
  pub role:         Role,
  pub display_name: String,
}

impl NewActor {
  pub fn new(role: Role, display_name: impl Into<String>) -> Self {
    Self { role, display_name: display_name.into() }
  }
}
