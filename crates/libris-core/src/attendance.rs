//! [`AttendanceRecorder`] turns scanned codes into attendance events.
//!
//! The recorder resolves a code to a person, infers whether the scan is an
//! entry or an exit from that person's latest event of the day, and appends
//! a new event. It takes no locks: racing scans of the same code may both
//! read the same latest event and record the same direction twice, which the
//! append-only log tolerates.

use std::{future::Future, time::Duration};

use chrono::{DateTime, FixedOffset, Local, NaiveDate};
use uuid::Uuid;

use crate::{
  Error, Result,
  event::{AttendanceEvent, Direction, NewAttendanceEvent},
  person::{Person, PersonSnapshot},
  status::{AttendanceView, infer_from_events},
  store::{EventStore, PersonDirectory},
};

/// Default bound on each directory or event-store call.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Records attendance scans against a person directory and an event log.
#[derive(Debug, Clone)]
pub struct AttendanceRecorder<D, E> {
  directory:  D,
  events:     E,
  io_timeout: Duration,
}

impl<D, E> AttendanceRecorder<D, E>
where
  D: PersonDirectory,
  E: EventStore,
{
  pub fn new(directory: D, events: E) -> Self {
    Self { directory, events, io_timeout: DEFAULT_IO_TIMEOUT }
  }

  pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
    self.io_timeout = io_timeout;
    self
  }

  pub fn directory(&self) -> &D { &self.directory }

  pub fn events(&self) -> &E { &self.events }

  /// Run a collaborator call under the I/O timeout. An elapsed timeout is
  /// reported through `on_err` like any other failure of that call.
  async fn bounded<T, Er>(
    &self,
    fut: impl Future<Output = Result<T, Er>>,
    on_err: fn(BoundedError<Er>) -> Error,
  ) -> Result<T>
  where
    Er: std::error::Error + Send + Sync + 'static,
  {
    match tokio::time::timeout(self.io_timeout, fut).await {
      Ok(Ok(v)) => Ok(v),
      Ok(Err(e)) => Err(on_err(BoundedError::Inner(e))),
      Err(elapsed) => Err(on_err(BoundedError::Elapsed(elapsed))),
    }
  }

  // ── Lookup ──────────────────────────────────────────────────────────────

  /// Resolve a scanned code (matched exactly against `code` or
  /// `student_id`) to a person.
  pub async fn resolve_person(&self, code: &str) -> Result<Person> {
    self
      .bounded(self.directory.find_by_code(code), Error::directory)
      .await?
      .ok_or_else(|| Error::PersonNotFound(code.to_owned()))
  }

  /// Suggest the direction of the next scan for `person_id` on `as_of`.
  ///
  /// Advisory only: a failed or slow event lookup is logged and degrades to
  /// [`Direction::In`] instead of blocking the scan.
  pub async fn infer_direction(
    &self,
    person_id: Uuid,
    as_of: NaiveDate,
  ) -> Direction {
    let lookup = self
      .bounded(
        self.events.query_by_person_and_date(person_id, as_of),
        Error::persistence,
      )
      .await;

    match lookup {
      Ok(events) => infer_from_events(&events),
      Err(e) => {
        tracing::warn!(
          %person_id,
          date = %as_of,
          error = %e,
          "could not load today's events; defaulting direction to in"
        );
        Direction::In
      }
    }
  }

  // ── Recording ───────────────────────────────────────────────────────────

  /// Record a scan at the current local time.
  pub async fn record_scan(&self, code: &str) -> Result<AttendanceEvent> {
    self.record_scan_at(code, Local::now().fixed_offset()).await
  }

  /// Record a scan as if it happened at `now`. The event's date is the
  /// calendar date of `now` in its own offset.
  pub async fn record_scan_at(
    &self,
    code: &str,
    now: DateTime<FixedOffset>,
  ) -> Result<AttendanceEvent> {
    let code = code.trim();
    if code.is_empty() {
      return Err(Error::InvalidInput("scan code is empty".into()));
    }

    let person = self.resolve_person(code).await?;
    let snapshot = PersonSnapshot::from_person(&person)?;
    let direction = self.infer_direction(person.person_id, now.date_naive()).await;

    let input = NewAttendanceEvent::new(person.person_id, direction, now, snapshot);
    let event_id = self
      .bounded(self.events.append(input.clone()), Error::persistence)
      .await?;

    if event_id.is_nil() {
      return Err(Error::Persistence(
        "event store acknowledged the append without a record id".into(),
      ));
    }

    let event = input.into_event(event_id);
    tracing::info!(
      event_id = %event.event_id,
      person_id = %event.person_id,
      code = %event.snapshot.code,
      direction = %event.direction,
      "attendance recorded"
    );
    Ok(event)
  }

  /// Hard-delete an event by id.
  pub async fn delete_event(&self, event_id: Uuid) -> Result<()> {
    let removed = self
      .bounded(self.events.delete(event_id), Error::persistence)
      .await?;

    if !removed {
      return Err(Error::EventNotFound(event_id));
    }

    tracing::info!(%event_id, "attendance event deleted");
    Ok(())
  }

  // ── Reads ───────────────────────────────────────────────────────────────

  /// Every event recorded on `date`.
  pub async fn daily_log(&self, date: NaiveDate) -> Result<Vec<AttendanceEvent>> {
    self
      .bounded(self.events.query_by_date(date), Error::persistence)
      .await
  }

  /// Materialise the attendance view of the person behind `code` on `date`.
  pub async fn day_view(&self, code: &str, date: NaiveDate) -> Result<AttendanceView> {
    let code = code.trim();
    if code.is_empty() {
      return Err(Error::InvalidInput("scan code is empty".into()));
    }

    let person = self.resolve_person(code).await?;
    let events = self
      .bounded(
        self.events.query_by_person_and_date(person.person_id, date),
        Error::persistence,
      )
      .await?;

    let snapshot = PersonSnapshot::from_person(&person).ok();
    Ok(AttendanceView::build(snapshot, date, events))
  }
}

// ─── Timeout plumbing ────────────────────────────────────────────────────────

/// A collaborator failure or an elapsed I/O timeout.
#[derive(Debug, thiserror::Error)]
pub enum BoundedError<E> {
  #[error(transparent)]
  Inner(E),
  #[error("timed out: {0}")]
  Elapsed(tokio::time::error::Elapsed),
}
