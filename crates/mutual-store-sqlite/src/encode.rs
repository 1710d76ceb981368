//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings (so
//! their text order equals their byte order), and enums use their `strum`
//! snake-case names.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use mutual_core::{
  actor::{Actor, Role},
  record::{MatchRecord, MatchStatus, PairKey},
  second_look::SecondLookCandidate,
  swipe::{Decision, SwipeEvent, SwipeIntent},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

/// Counters are `INTEGER` (i64) in SQLite and never negative.
pub fn decode_count(n: i64) -> Result<u64> {
  u64::try_from(n).map_err(|_| Error::Decode(format!("negative counter: {n}")))
}

pub fn encode_count(n: u64) -> Result<i64> {
  i64::try_from(n).map_err(|_| Error::Decode(format!("counter overflow: {n}")))
}

fn decode_enum<T: FromStr>(kind: &str, s: &str) -> Result<T> {
  T::from_str(s).map_err(|_| Error::Decode(format!("unknown {kind}: {s:?}")))
}

pub fn decode_role(s: &str) -> Result<Role> { decode_enum("role", s) }

pub fn decode_decision(s: &str) -> Result<Decision> {
  decode_enum("decision", s)
}

pub fn decode_status(s: &str) -> Result<MatchStatus> {
  decode_enum("match status", s)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `actors` row.
pub struct RawActor {
  pub actor_id:     String,
  pub role:         String,
  pub display_name: String,
  pub created_at:   String,
}

impl RawActor {
  pub const COLUMNS: &'static str = "actor_id, role, display_name, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      actor_id:     row.get(0)?,
      role:         row.get(1)?,
      display_name: row.get(2)?,
      created_at:   row.get(3)?,
    })
  }

  pub fn into_actor(self) -> Result<Actor> {
    Ok(Actor {
      actor_id:     decode_uuid(&self.actor_id)?,
      role:         decode_role(&self.role)?,
      display_name: self.display_name,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read from a `swipes` row.
pub struct RawIntent {
  pub actor_id:  String,
  pub target_id: String,
  pub decision:  String,
  pub swiped_at: String,
  pub revision:  i64,
}

impl RawIntent {
  pub const COLUMNS: &'static str =
    "actor_id, target_id, decision, swiped_at, revision";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      actor_id:  row.get(0)?,
      target_id: row.get(1)?,
      decision:  row.get(2)?,
      swiped_at: row.get(3)?,
      revision:  row.get(4)?,
    })
  }

  pub fn into_intent(self) -> Result<SwipeIntent> {
    Ok(SwipeIntent {
      actor_id:  decode_uuid(&self.actor_id)?,
      target_id: decode_uuid(&self.target_id)?,
      decision:  decode_decision(&self.decision)?,
      swiped_at: decode_dt(&self.swiped_at)?,
      revision:  decode_count(self.revision)?,
    })
  }
}

/// Raw values read from a `swipe_events` row.
pub struct RawEvent {
  pub actor_id:    String,
  pub target_id:   String,
  pub decision:    String,
  pub revision:    i64,
  pub recorded_at: String,
}

impl RawEvent {
  pub fn into_event(self) -> Result<SwipeEvent> {
    Ok(SwipeEvent {
      actor_id:    decode_uuid(&self.actor_id)?,
      target_id:   decode_uuid(&self.target_id)?,
      decision:    decode_decision(&self.decision)?,
      revision:    decode_count(self.revision)?,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw values read from a `matches` row.
pub struct RawMatch {
  pub jobseeker_id: String,
  pub employer_id:  String,
  pub status:       String,
  pub version:      i64,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawMatch {
  pub const COLUMNS: &'static str =
    "jobseeker_id, employer_id, status, version, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      jobseeker_id: row.get(0)?,
      employer_id:  row.get(1)?,
      status:       row.get(2)?,
      version:      row.get(3)?,
      created_at:   row.get(4)?,
      updated_at:   row.get(5)?,
    })
  }

  pub fn into_record(self) -> Result<MatchRecord> {
    Ok(MatchRecord {
      pair:       PairKey::new(
        decode_uuid(&self.jobseeker_id)?,
        decode_uuid(&self.employer_id)?,
      ),
      status:     decode_status(&self.status)?,
      version:    decode_count(self.version)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values of one second-look query row.
pub struct RawCandidate {
  pub target_id:            String,
  pub status:               String,
  pub counterpart_decision: Option<String>,
  pub rejected_at:          String,
}

impl RawCandidate {
  pub fn into_candidate(self) -> Result<SecondLookCandidate> {
    Ok(SecondLookCandidate {
      target_id:            decode_uuid(&self.target_id)?,
      status:               decode_status(&self.status)?,
      counterpart_decision: self
        .counterpart_decision
        .as_deref()
        .map(decode_decision)
        .transpose()?,
      rejected_at:          decode_dt(&self.rejected_at)?,
    })
  }
}
