//! [`SqliteStore`], the SQLite implementation of [`SwipeStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use mutual_core::{
  actor::{Actor, NewActor},
  machine,
  record::{MatchRecord, MatchStatus, PairKey},
  second_look::SecondLookCandidate,
  store::{Directory, SwipeCommit, SwipeStore},
  swipe::{NewSwipe, SwipeEvent, SwipeIntent},
};
use rusqlite::{ErrorCode, OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    RawActor, RawCandidate, RawEvent, RawIntent, RawMatch, decode_count,
    decode_decision, encode_count, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A swipe store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// run on the connection's own thread, one at a time, and each swipe commit is
/// a single `BEGIN IMMEDIATE` transaction. Commits are therefore serialised
/// across every pair, not only within one: swipes on unrelated pairs queue
/// behind each other here, unlike with `MemoryStore`.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    tracing::debug!(path = %path.as_ref().display(), "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Swipe commit ────────────────────────────────────────────────────────────

fn is_busy(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if matches!(f.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
  )
}

fn busy_as_conflict(pair: PairKey) -> impl Fn(rusqlite::Error) -> Error {
  move |e| if is_busy(&e) { Error::Conflict(pair) } else { Error::Sqlite(e) }
}

/// Upsert the intent, append the audit event and settle the pair, all in one
/// immediate transaction. Dropping `tx` on any early return rolls back.
fn commit_swipe(
  conn: &mut rusqlite::Connection,
  swipe: &NewSwipe,
  now: DateTime<Utc>,
) -> Result<SwipeCommit> {
  let pair = swipe.pair();
  let tx = conn
    .transaction_with_behavior(TransactionBehavior::Immediate)
    .map_err(busy_as_conflict(pair))?;

  let actor_id  = encode_uuid(swipe.actor_id());
  let target_id = encode_uuid(swipe.target_id());
  let decision  = swipe.decision().to_string();
  let now_str   = encode_dt(now);

  let revision: i64 = tx.query_row(
    "INSERT INTO swipes (actor_id, target_id, decision, swiped_at, revision)
     VALUES (?1, ?2, ?3, ?4, 1)
     ON CONFLICT (actor_id, target_id) DO UPDATE SET
       decision  = excluded.decision,
       swiped_at = excluded.swiped_at,
       revision  = swipes.revision + 1
     RETURNING revision",
    rusqlite::params![actor_id, target_id, decision, now_str],
    |row| row.get(0),
  )?;

  tx.execute(
    "INSERT INTO swipe_events (actor_id, target_id, decision, revision, recorded_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![actor_id, target_id, decision, revision, now_str],
  )?;

  let counterpart = tx
    .query_row(
      "SELECT decision FROM swipes WHERE actor_id = ?1 AND target_id = ?2",
      rusqlite::params![target_id, actor_id],
      |row| row.get::<_, String>(0),
    )
    .optional()?
    .as_deref()
    .map(decode_decision)
    .transpose()?;

  let jobseeker_id = encode_uuid(pair.jobseeker_id);
  let employer_id  = encode_uuid(pair.employer_id);

  let prior = tx
    .query_row(
      &format!(
        "SELECT {} FROM matches WHERE jobseeker_id = ?1 AND employer_id = ?2",
        RawMatch::COLUMNS
      ),
      rusqlite::params![jobseeker_id, employer_id],
      RawMatch::from_row,
    )
    .optional()?
    .map(RawMatch::into_record)
    .transpose()?;

  let transition = machine::settle(
    prior.as_ref().map(|r| r.status),
    swipe.decision(),
    counterpart,
  );
  let status = transition.status.to_string();

  let record = match prior {
    Some(mut record) if transition.changed() => {
      let updated = tx.execute(
        "UPDATE matches
         SET status = ?1, version = version + 1, updated_at = ?2
         WHERE jobseeker_id = ?3 AND employer_id = ?4 AND version = ?5",
        rusqlite::params![
          status,
          now_str,
          jobseeker_id,
          employer_id,
          encode_count(record.version)?,
        ],
      )?;
      if updated != 1 {
        return Err(Error::Conflict(pair));
      }
      record.status = transition.status;
      record.version += 1;
      record.updated_at = now;
      record
    }
    Some(record) => record,
    None => {
      tx.execute(
        "INSERT INTO matches
           (jobseeker_id, employer_id, status, version, created_at, updated_at)
         VALUES (?1, ?2, ?3, 1, ?4, ?4)",
        rusqlite::params![jobseeker_id, employer_id, status, now_str],
      )?;
      MatchRecord {
        pair,
        status: transition.status,
        version: 1,
        created_at: now,
        updated_at: now,
      }
    }
  };

  tx.commit().map_err(busy_as_conflict(pair))?;

  let intent = SwipeIntent {
    actor_id:  swipe.actor_id(),
    target_id: swipe.target_id(),
    decision:  swipe.decision(),
    swiped_at: now,
    revision:  decode_count(revision)?,
  };
  Ok(SwipeCommit { intent, transition, record })
}

// ─── Directory impl ──────────────────────────────────────────────────────────

impl Directory for SqliteStore {
  type Error = Error;

  async fn register_actor(&self, input: NewActor) -> Result<Actor> {
    self.register_actor_with_id(Uuid::new_v4(), input).await
  }

  async fn register_actor_with_id(
    &self,
    id: Uuid,
    input: NewActor,
  ) -> Result<Actor> {
    let actor = Actor {
      actor_id:     id,
      role:         input.role,
      display_name: input.display_name,
      created_at:   Utc::now(),
    };

    let id_str   = encode_uuid(actor.actor_id);
    let role_str = actor.role.to_string();
    let name     = actor.display_name.clone();
    let at_str   = encode_dt(actor.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO actors (actor_id, role, display_name, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, role_str, name, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(actor)
  }

  async fn get_actor(&self, id: Uuid) -> Result<Option<Actor>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawActor> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM actors WHERE actor_id = ?1", RawActor::COLUMNS),
              rusqlite::params![id_str],
              RawActor::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawActor::into_actor).transpose()
  }
}

// ─── SwipeStore impl ─────────────────────────────────────────────────────────

impl SwipeStore for SqliteStore {
  async fn record_swipe(&self, swipe: NewSwipe) -> Result<SwipeCommit> {
    let now = Utc::now();
    let commit = self
      .conn
      .call(move |conn| Ok(commit_swipe(conn, &swipe, now)))
      .await??;
    tracing::debug!(
      pair = %commit.record.pair,
      revision = commit.intent.revision,
      version = commit.record.version,
      "sqlite swipe commit"
    );
    Ok(commit)
  }

  async fn get_intent(
    &self,
    actor_id: Uuid,
    target_id: Uuid,
  ) -> Result<Option<SwipeIntent>> {
    let actor_str  = encode_uuid(actor_id);
    let target_str = encode_uuid(target_id);

    let raw: Option<RawIntent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM swipes WHERE actor_id = ?1 AND target_id = ?2",
                RawIntent::COLUMNS
              ),
              rusqlite::params![actor_str, target_str],
              RawIntent::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawIntent::into_intent).transpose()
  }

  async fn get_match(&self, pair: PairKey) -> Result<Option<MatchRecord>> {
    let jobseeker_str = encode_uuid(pair.jobseeker_id);
    let employer_str  = encode_uuid(pair.employer_id);

    let raw: Option<RawMatch> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM matches WHERE jobseeker_id = ?1 AND employer_id = ?2",
                RawMatch::COLUMNS
              ),
              rusqlite::params![jobseeker_str, employer_str],
              RawMatch::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawMatch::into_record).transpose()
  }

  async fn list_matches(
    &self,
    actor_id: Uuid,
    status: Option<MatchStatus>,
  ) -> Result<Vec<MatchRecord>> {
    let actor_str  = encode_uuid(actor_id);
    let status_str = status.map(|s| s.to_string());

    let raws: Vec<RawMatch> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM matches
           WHERE (jobseeker_id = ?1 OR employer_id = ?1)
             AND (?2 IS NULL OR status = ?2)
           ORDER BY updated_at DESC, jobseeker_id, employer_id",
          RawMatch::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![actor_str, status_str], RawMatch::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMatch::into_record).collect()
  }

  async fn reconsiderable_page(
    &self,
    actor_id: Uuid,
    after: Option<Uuid>,
    limit: usize,
  ) -> Result<Vec<SecondLookCandidate>> {
    let actor_str = encode_uuid(actor_id);
    let after_str = after.map(encode_uuid);
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawCandidate> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT s.target_id, m.status, c.decision, s.swiped_at
           FROM swipes s
           JOIN matches m
             ON (m.jobseeker_id = s.actor_id AND m.employer_id  = s.target_id)
             OR (m.employer_id  = s.actor_id AND m.jobseeker_id = s.target_id)
           LEFT JOIN swipes c
             ON c.actor_id = s.target_id AND c.target_id = s.actor_id
           WHERE s.actor_id = ?1
             AND s.decision = 'not_interested'
             AND m.status  != 'matched'
             AND (?2 IS NULL OR s.target_id > ?2)
           ORDER BY s.target_id
           LIMIT ?3",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![actor_str, after_str, limit_val], |row| {
            Ok(RawCandidate {
              target_id:            row.get(0)?,
              status:               row.get(1)?,
              counterpart_decision: row.get(2)?,
              rejected_at:          row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCandidate::into_candidate).collect()
  }

  async fn inbound_intents(&self, target_id: Uuid) -> Result<Vec<SwipeIntent>> {
    let target_str = encode_uuid(target_id);

    let raws: Vec<RawIntent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM swipes WHERE target_id = ?1 ORDER BY actor_id",
          RawIntent::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![target_str], RawIntent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawIntent::into_intent).collect()
  }

  async fn swipe_history(
    &self,
    actor_id: Uuid,
    target_id: Uuid,
  ) -> Result<Vec<SwipeEvent>> {
    let actor_str  = encode_uuid(actor_id);
    let target_str = encode_uuid(target_id);

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT actor_id, target_id, decision, revision, recorded_at
           FROM swipe_events
           WHERE actor_id = ?1 AND target_id = ?2
           ORDER BY revision",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![actor_str, target_str], |row| {
            Ok(RawEvent {
              actor_id:    row.get(0)?,
              target_id:   row.get(1)?,
              decision:    row.get(2)?,
              revision:    row.get(3)?,
              recorded_at: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }
}
