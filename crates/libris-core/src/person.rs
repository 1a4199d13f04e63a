//! The registered individual a scan code resolves to.
//!
//! People are owned by the registration flow; the attendance core only reads
//! them. Events copy the display fields into a [`PersonSnapshot`] so history
//! stays readable after the person record changes or disappears.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// A registered person (student, member, staff).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub person_id:  Uuid,
  /// The scannable barcode / ID-card string. Unique within a directory.
  pub code:       String,
  /// Secondary identifier (e.g. a student number). Scans match it too.
  pub student_id: Option<String>,
  pub name:       Option<String>,
  /// Organisational grouping, e.g. "BSCS 2-A".
  pub group:      Option<String>,
  pub email:      Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::PersonRegistry::register`].
/// `person_id` and `created_at` are always set by the store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPerson {
  pub code:       String,
  pub student_id: Option<String>,
  pub name:       Option<String>,
  pub group:      Option<String>,
  pub email:      Option<String>,
}

/// The person fields copied onto every attendance event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonSnapshot {
  pub name:       String,
  pub group:      String,
  pub code:       String,
  pub student_id: String,
}

impl PersonSnapshot {
  /// Build a snapshot, refusing people whose display fields are missing or
  /// blank. A recorded event must describe itself without the person record.
  pub fn from_person(person: &Person) -> Result<Self> {
    fn present(v: &Option<String>) -> Option<&str> {
      v.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    let name = present(&person.name);
    let group = present(&person.group);
    let student_id = present(&person.student_id);

    let mut missing = Vec::new();
    if name.is_none() {
      missing.push("name");
    }
    if group.is_none() {
      missing.push("group");
    }
    if student_id.is_none() {
      missing.push("student_id");
    }

    match (name, group, student_id) {
      (Some(name), Some(group), Some(student_id)) => Ok(Self {
        name:       name.to_owned(),
        group:      group.to_owned(),
        code:       person.code.clone(),
        student_id: student_id.to_owned(),
      }),
      _ => Err(Error::IncompletePerson {
        code: person.code.clone(),
        missing,
      }),
    }
  }
}
