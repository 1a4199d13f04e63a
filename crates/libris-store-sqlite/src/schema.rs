//! SQL schema for the libris SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS people (
    person_id   TEXT PRIMARY KEY,
    code        TEXT NOT NULL UNIQUE,   -- scannable barcode / card string
    student_id  TEXT,                   -- secondary identifier, also scannable
    name        TEXT,
    group_name  TEXT,                   -- course / section
    email       TEXT,
    created_at  TEXT NOT NULL           -- ISO 8601 UTC; server-assigned
);

-- Attendance events are append-only. No UPDATE is ever issued against this
-- table; rows leave only through an explicit DELETE by event_id.
-- person_id carries no foreign key: the snapshot columns keep an event
-- readable after its person is edited or removed.
CREATE TABLE IF NOT EXISTS attendance_events (
    seq                 INTEGER PRIMARY KEY AUTOINCREMENT,  -- insertion order
    event_id            TEXT NOT NULL UNIQUE,
    person_id           TEXT NOT NULL,
    direction           TEXT NOT NULL CHECK (direction IN ('in', 'out')),
    recorded_at         TEXT NOT NULL,  -- RFC 3339 with local offset
    event_date          TEXT NOT NULL,  -- YYYY-MM-DD, local calendar date
    snapshot_name       TEXT NOT NULL,
    snapshot_group      TEXT NOT NULL,
    snapshot_code       TEXT NOT NULL,
    snapshot_student_id TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS people_student_idx      ON people(student_id);
CREATE INDEX IF NOT EXISTS events_person_date_idx  ON attendance_events(person_id, event_date);
CREATE INDEX IF NOT EXISTS events_date_idx         ON attendance_events(event_date);

PRAGMA user_version = 1;
";
