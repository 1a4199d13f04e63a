//! [`SqliteStore`]: the SQLite implementation of the libris collaborator
//! traits ([`PersonDirectory`], [`PersonRegistry`], [`EventStore`]).

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use libris_core::{
  event::{AttendanceEvent, NewAttendanceEvent},
  person::{NewPerson, Person},
  store::{EventStore, PersonDirectory, PersonRegistry},
};

use crate::{
  Error, Result,
  encode::{
    EVENT_COLUMNS, PERSON_COLUMNS, RawEvent, RawPerson, encode_date, encode_direction,
    encode_local, encode_utc, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A libris store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
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

  /// Run an event query with a single text parameter per placeholder.
  async fn query_events(
    &self,
    where_clause: &'static str,
    params: Vec<String>,
  ) -> Result<Vec<AttendanceEvent>> {
    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {EVENT_COLUMNS} FROM attendance_events WHERE {where_clause} ORDER BY seq"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }
}

// ─── PersonDirectory impl ────────────────────────────────────────────────────

impl PersonDirectory for SqliteStore {
  type Error = Error;

  async fn find_by_code<'a>(&'a self, code: &'a str) -> Result<Option<Person>> {
    let code = code.to_owned();

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        // `=` on TEXT uses BINARY collation, so matching is case-sensitive.
        let sql = format!(
          "SELECT {PERSON_COLUMNS} FROM people
           WHERE code = ?1 OR student_id = ?1
           ORDER BY (code = ?1) DESC, rowid
           LIMIT 1"
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![code], RawPerson::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn list_people(&self) -> Result<Vec<Person>> {
    let raws: Vec<RawPerson> = self
      .conn
      .call(|conn| {
        let sql = format!("SELECT {PERSON_COLUMNS} FROM people ORDER BY rowid");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }
}

// ─── PersonRegistry impl ─────────────────────────────────────────────────────

impl PersonRegistry for SqliteStore {
  async fn register(&self, input: NewPerson) -> Result<Person> {
    let person = Person {
      person_id:  Uuid::new_v4(),
      code:       input.code.trim().to_owned(),
      student_id: input.student_id,
      name:       input.name,
      group:      input.group,
      email:      input.email,
      created_at: Utc::now(),
    };

    let id_str     = encode_uuid(person.person_id);
    let code       = person.code.clone();
    let student_id = person.student_id.clone();
    let name       = person.name.clone();
    let group      = person.group.clone();
    let email      = person.email.clone();
    let at_str     = encode_utc(person.created_at);

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let taken: bool = conn
          .query_row(
            "SELECT 1 FROM people WHERE code = ?1",
            rusqlite::params![code],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if taken {
          return Ok(false);
        }

        conn.execute(
          "INSERT INTO people (person_id, code, student_id, name, group_name, email, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, code, student_id, name, group, email, at_str],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::DuplicateCode(person.code));
    }

    tracing::debug!(person_id = %person.person_id, code = %person.code, "person registered");
    Ok(person)
  }

  fn is_conflict(err: &Error) -> bool { matches!(err, Error::DuplicateCode(_)) }
}

// ─── EventStore impl ─────────────────────────────────────────────────────────

impl EventStore for SqliteStore {
  type Error = Error;

  async fn query_by_person_and_date(
    &self,
    person_id: Uuid,
    date: NaiveDate,
  ) -> Result<Vec<AttendanceEvent>> {
    self
      .query_events(
        "person_id = ?1 AND event_date = ?2",
        vec![encode_uuid(person_id), encode_date(date)],
      )
      .await
  }

  async fn query_by_date(&self, date: NaiveDate) -> Result<Vec<AttendanceEvent>> {
    self
      .query_events("event_date = ?1", vec![encode_date(date)])
      .await
  }

  async fn append(&self, event: NewAttendanceEvent) -> Result<Uuid> {
    let event_id = Uuid::new_v4();

    let id_str         = encode_uuid(event_id);
    let person_id_str  = encode_uuid(event.person_id);
    let direction_str  = encode_direction(event.direction);
    let recorded_str   = encode_local(event.recorded_at);
    let date_str       = encode_date(event.date);
    let snap           = event.snapshot;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO attendance_events (
             event_id, person_id, direction, recorded_at, event_date,
             snapshot_name, snapshot_group, snapshot_code, snapshot_student_id
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            person_id_str,
            direction_str,
            recorded_str,
            date_str,
            snap.name,
            snap.group,
            snap.code,
            snap.student_id,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(event_id)
  }

  async fn delete(&self, event_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(event_id);

    let removed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM attendance_events WHERE event_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }
}
