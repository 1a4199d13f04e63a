//! Collaborator traits for person lookup and the attendance event log.
//!
//! The traits are implemented by storage backends (e.g.
//! `libris-store-sqlite`). [`crate::AttendanceRecorder`] and the HTTP layer
//! depend on these abstractions, not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  event::{AttendanceEvent, NewAttendanceEvent},
  person::{NewPerson, Person},
};

// ─── People ──────────────────────────────────────────────────────────────────

/// Read access to registered people.
///
/// All methods return `Send` futures so implementations can be shared across
/// a multi-threaded runtime (e.g. tokio with `axum`).
pub trait PersonDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Find the person whose `code` or `student_id` equals `code` exactly
  /// (case-sensitive). A `code` match takes precedence. Returns `None` on a
  /// miss; errors are reserved for the directory itself failing.
  fn find_by_code<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + 'a;

  /// List every registered person in registration order.
  fn list_people(
    &self,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;
}

/// Write access used by the registration flow.
pub trait PersonRegistry: PersonDirectory {
  /// Persist a new person. Fails if `code` is already registered; the
  /// check and the insert must be atomic.
  fn register(
    &self,
    input: NewPerson,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Whether `err`, returned by [`register`](PersonRegistry::register),
  /// means the code was already taken.
  fn is_conflict(err: &Self::Error) -> bool {
    let _ = err;
    false
  }
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// The append-only attendance log.
///
/// Events are never updated in place; the only destructive operation is an
/// explicit hard [`delete`](EventStore::delete).
pub trait EventStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All events of `person_id` whose local date is `date`, in insertion
  /// order.
  fn query_by_person_and_date(
    &self,
    person_id: Uuid,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<AttendanceEvent>, Self::Error>> + Send + '_;

  /// All events on `date`, in insertion order.
  fn query_by_date(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<AttendanceEvent>, Self::Error>> + Send + '_;

  /// Append an event and return the identifier of the new record.
  fn append(
    &self,
    event: NewAttendanceEvent,
  ) -> impl Future<Output = Result<Uuid, Self::Error>> + Send + '_;

  /// Remove an event. Returns `false` if no event had that id.
  fn delete(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
