//! Attendance events: the append-only log behind check-in/check-out.
//!
//! An event is never updated. Each scan appends a new one, including
//! consecutive scans in the same direction; the "current status" of a person
//! is derived from the log on read (see [`crate::status`]).

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::person::PersonSnapshot;

// ─── Direction ───────────────────────────────────────────────────────────────

/// Whether a scan marks entry or exit.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
  In,
  Out,
}

impl Direction {
  pub fn opposite(self) -> Self {
    match self {
      Self::In => Self::Out,
      Self::Out => Self::In,
    }
  }
}

// ─── AttendanceEvent ─────────────────────────────────────────────────────────

/// An immutable attendance record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEvent {
  pub event_id:    Uuid,
  pub person_id:   Uuid,
  pub direction:   Direction,
  /// Wall-clock time of the scan, carrying the local UTC offset.
  pub recorded_at: DateTime<FixedOffset>,
  /// Local calendar date of `recorded_at`; the per-day filter key.
  pub date:        NaiveDate,
  pub snapshot:    PersonSnapshot,
}

// ─── NewAttendanceEvent ──────────────────────────────────────────────────────

/// Input to [`crate::store::EventStore::append`]. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendanceEvent {
  pub person_id:   Uuid,
  pub direction:   Direction,
  pub recorded_at: DateTime<FixedOffset>,
  pub date:        NaiveDate,
  pub snapshot:    PersonSnapshot,
}

impl NewAttendanceEvent {
  /// Build an event whose `date` is derived from `recorded_at`.
  pub fn new(
    person_id: Uuid,
    direction: Direction,
    recorded_at: DateTime<FixedOffset>,
    snapshot: PersonSnapshot,
  ) -> Self {
    Self {
      person_id,
      direction,
      recorded_at,
      date: recorded_at.date_naive(),
      snapshot,
    }
  }

  /// Attach the identifier the store acknowledged.
  pub fn into_event(self, event_id: Uuid) -> AttendanceEvent {
    AttendanceEvent {
      event_id,
      person_id: self.person_id,
      direction: self.direction,
      recorded_at: self.recorded_at,
      date: self.date,
      snapshot: self.snapshot,
    }
  }
}
