//! SQL schema for the Mutual SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS actors (
    actor_id     TEXT PRIMARY KEY,
    role         TEXT NOT NULL,   -- 'jobseeker' | 'employer'
    display_name TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

-- Latest intent per ordered (actor, target). Overwritten in place.
CREATE TABLE IF NOT EXISTS swipes (
    actor_id  TEXT NOT NULL REFERENCES actors(actor_id),
    target_id TEXT NOT NULL REFERENCES actors(actor_id),
    decision  TEXT NOT NULL,      -- 'interested' | 'not_interested'
    swiped_at TEXT NOT NULL,      -- RFC 3339 UTC
    revision  INTEGER NOT NULL,   -- write counter, starts at 1
    PRIMARY KEY (actor_id, target_id),
    CHECK (actor_id != target_id)
);

-- Every accepted write. Strictly append-only.
CREATE TABLE IF NOT EXISTS swipe_events (
    event_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    actor_id    TEXT NOT NULL REFERENCES actors(actor_id),
    target_id   TEXT NOT NULL REFERENCES actors(actor_id),
    decision    TEXT NOT NULL,
    revision    INTEGER NOT NULL,
    recorded_at TEXT NOT NULL,
    UNIQUE (actor_id, target_id, revision)
);

-- One row per unordered pair, keyed by role. Never deleted.
CREATE TABLE IF NOT EXISTS matches (
    jobseeker_id TEXT NOT NULL REFERENCES actors(actor_id),
    employer_id  TEXT NOT NULL REFERENCES actors(actor_id),
    status       TEXT NOT NULL,   -- 'pending' | 'matched' | 'rejected'
    version      INTEGER NOT NULL,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    PRIMARY KEY (jobseeker_id, employer_id)
);

CREATE INDEX IF NOT EXISTS swipes_target_idx     ON swipes(target_id);
CREATE INDEX IF NOT EXISTS matches_employer_idx  ON matches(employer_id);

PRAGMA user_version = 1;
";
