//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Person timestamps are stored as RFC 3339 UTC strings, event timestamps as
//! RFC 3339 with their local offset, dates as `YYYY-MM-DD`. UUIDs are stored
//! as hyphenated lowercase strings.

use std::str::FromStr as _;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use libris_core::{
  event::{AttendanceEvent, Direction},
  person::{Person, PersonSnapshot},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Timestamps and dates ─────────────────────────────────────────────────────

pub fn encode_utc(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_utc(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_local(dt: DateTime<FixedOffset>) -> String { dt.to_rfc3339() }

pub fn decode_local(s: &str) -> Result<DateTime<FixedOffset>> {
  DateTime::parse_from_rfc3339(s).map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Direction ────────────────────────────────────────────────────────────────

pub fn encode_direction(d: Direction) -> &'static str {
  match d {
    Direction::In => "in",
    Direction::Out => "out",
  }
}

pub fn decode_direction(s: &str) -> Result<Direction> {
  Direction::from_str(s).map_err(|_| Error::Decode(format!("unknown direction: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawPerson::from_row`].
pub const PERSON_COLUMNS: &str =
  "person_id, code, student_id, name, group_name, email, created_at";

/// Raw strings read directly from a `people` row.
pub struct RawPerson {
  pub person_id:  String,
  pub code:       String,
  pub student_id: Option<String>,
  pub name:       Option<String>,
  pub group_name: Option<String>,
  pub email:      Option<String>,
  pub created_at: String,
}

impl RawPerson {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id:  row.get(0)?,
      code:       row.get(1)?,
      student_id: row.get(2)?,
      name:       row.get(3)?,
      group_name: row.get(4)?,
      email:      row.get(5)?,
      created_at: row.get(6)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      person_id:  decode_uuid(&self.person_id)?,
      code:       self.code,
      student_id: self.student_id,
      name:       self.name,
      group:      self.group_name,
      email:      self.email,
      created_at: decode_utc(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawEvent::from_row`].
pub const EVENT_COLUMNS: &str = "event_id, person_id, direction, recorded_at, \
   event_date, snapshot_name, snapshot_group, snapshot_code, snapshot_student_id";

/// Raw strings read directly from an `attendance_events` row.
pub struct RawEvent {
  pub event_id:            String,
  pub person_id:           String,
  pub direction:           String,
  pub recorded_at:         String,
  pub event_date:          String,
  pub snapshot_name:       String,
  pub snapshot_group:      String,
  pub snapshot_code:       String,
  pub snapshot_student_id: String,
}

impl RawEvent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:            row.get(0)?,
      person_id:           row.get(1)?,
      direction:           row.get(2)?,
      recorded_at:         row.get(3)?,
      event_date:          row.get(4)?,
      snapshot_name:       row.get(5)?,
      snapshot_group:      row.get(6)?,
      snapshot_code:       row.get(7)?,
      snapshot_student_id: row.get(8)?,
    })
  }

  pub fn into_event(self) -> Result<AttendanceEvent> {
    Ok(AttendanceEvent {
      event_id:    decode_uuid(&self.event_id)?,
      person_id:   decode_uuid(&self.person_id)?,
      direction:   decode_direction(&self.direction)?,
      recorded_at: decode_local(&self.recorded_at)?,
      date:        decode_date(&self.event_date)?,
      snapshot:    PersonSnapshot {
        name:       self.snapshot_name,
        group:      self.snapshot_group,
        code:       self.snapshot_code,
        student_id: self.snapshot_student_id,
      },
    })
  }
}
