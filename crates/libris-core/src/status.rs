//! Derived attendance views.
//!
//! Nothing here is stored. A person's status, sessions and session lengths
//! are computed from the day's events each time they are asked for.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
  event::{AttendanceEvent, Direction},
  person::PersonSnapshot,
};

// ─── Inferred direction ──────────────────────────────────────────────────────

/// The direction the next scan should take, given the events of one person on
/// one day: the opposite of the latest event, or [`Direction::In`] if there
/// are none.
///
/// Ties on `recorded_at` go to the later element, i.e. the later-inserted
/// event when `events` is in insertion order.
pub fn infer_from_events(events: &[AttendanceEvent]) -> Direction {
  events
    .iter()
    .max_by_key(|e| e.recorded_at)
    .map(|e| e.direction.opposite())
    .unwrap_or(Direction::In)
}

// ─── Session length ──────────────────────────────────────────────────────────

/// A wall-clock span in whole hours plus remainder minutes.
///
/// Both parts carry the sign of the span. An `out` that precedes its `in`
/// yields a negative duration; it is reported as is, not clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDuration {
  pub hours:   i64,
  pub minutes: i64,
}

impl SessionDuration {
  pub fn from_minutes(total: i64) -> Self {
    Self { hours: total / 60, minutes: total % 60 }
  }

  pub fn total_minutes(&self) -> i64 { self.hours * 60 + self.minutes }

  pub fn is_negative(&self) -> bool { self.total_minutes() < 0 }
}

impl fmt::Display for SessionDuration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let sign = if self.is_negative() { "-" } else { "" };
    write!(f, "{sign}{}h {}m", self.hours.abs(), self.minutes.abs())
  }
}

/// `time_out − time_in`, or `None` when either end is missing.
pub fn session_duration(
  time_in: Option<DateTime<FixedOffset>>,
  time_out: Option<DateTime<FixedOffset>>,
) -> Option<SessionDuration> {
  let (time_in, time_out) = (time_in?, time_out?);
  Some(SessionDuration::from_minutes(
    (time_out - time_in).num_minutes(),
  ))
}

// ─── Sessions ────────────────────────────────────────────────────────────────

/// One visit: an `in` matched with the following `out`. Either end may be
/// missing when the log has unmatched scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub time_in:  Option<DateTime<FixedOffset>>,
  pub time_out: Option<DateTime<FixedOffset>>,
  pub duration: Option<SessionDuration>,
}

impl Session {
  fn new(
    time_in: Option<DateTime<FixedOffset>>,
    time_out: Option<DateTime<FixedOffset>>,
  ) -> Self {
    Self { time_in, time_out, duration: session_duration(time_in, time_out) }
  }
}

/// Pair events into sessions in chronological order.
///
/// An `in` opens a session; the next `out` closes it. A second `in` while a
/// session is open closes the open one without an `out`, and an `out` with
/// nothing open becomes a session without an `in`.
pub fn pair_sessions(events: &[AttendanceEvent]) -> Vec<Session> {
  let mut ordered: Vec<&AttendanceEvent> = events.iter().collect();
  // Stable sort keeps insertion order for equal timestamps.
  ordered.sort_by_key(|e| e.recorded_at);

  let mut sessions = Vec::new();
  let mut open: Option<DateTime<FixedOffset>> = None;

  for ev in ordered {
    match ev.direction {
      Direction::In => {
        if let Some(prev) = open.replace(ev.recorded_at) {
          sessions.push(Session::new(Some(prev), None));
        }
      }
      Direction::Out => {
        sessions.push(Session::new(open.take(), Some(ev.recorded_at)));
      }
    }
  }

  if let Some(prev) = open {
    sessions.push(Session::new(Some(prev), None));
  }

  sessions
}

// ─── Day view ────────────────────────────────────────────────────────────────

/// The computed attendance read model for one person on one day. Never
/// stored, always derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceView {
  /// `None` when the person record lacks display fields.
  pub person:         Option<PersonSnapshot>,
  pub date:           NaiveDate,
  pub events:         Vec<AttendanceEvent>,
  /// Advisory direction for the next scan.
  pub next_direction: Direction,
  pub sessions:       Vec<Session>,
}

impl AttendanceView {
  pub fn build(
    person: Option<PersonSnapshot>,
    date: NaiveDate,
    events: Vec<AttendanceEvent>,
  ) -> Self {
    Self {
      person,
      date,
      next_direction: infer_from_events(&events),
      sessions: pair_sessions(&events),
      events,
    }
  }
}
