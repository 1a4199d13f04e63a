//! Error type for `libris-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column held a value the domain types cannot represent.
  #[error("invalid stored value: {0}")]
  Decode(String),

  #[error("a person with code {0:?} is already registered")]
  DuplicateCode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
