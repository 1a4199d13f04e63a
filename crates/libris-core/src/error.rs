//! Error types for `libris-core`.

use thiserror::Error;
use uuid::Uuid;

/// Boxed collaborator error, kept as the `source` of infrastructure failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// Caller-supplied data was empty or malformed.
  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("no person matches code {0:?}")]
  PersonNotFound(String),

  #[error("attendance event not found: {0}")]
  EventNotFound(Uuid),

  /// The person directory itself failed (or timed out). This points at a
  /// misconfigured or unreachable backend, not at a bad scan.
  #[error("person directory unavailable: {0}")]
  DirectoryUnavailable(#[source] BoxError),

  #[error("persistence error: {0}")]
  Persistence(#[source] BoxError),

  #[error("person {code:?} is missing required fields: {}", .missing.join(", "))]
  IncompletePerson {
    code:    String,
    missing: Vec<&'static str>,
  },

  /// Every recipient of a mail operation failed.
  #[error("delivery failed for {} recipient(s): {reason}", .failed.len())]
  DeliveryFailed {
    failed: Vec<String>,
    reason: String,
  },
}

impl Error {
  /// `true` for lookup misses (person or event), as opposed to failures of
  /// the backing services.
  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::PersonNotFound(_) | Self::EventNotFound(_))
  }

  pub(crate) fn directory(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::DirectoryUnavailable(Box::new(e))
  }

  pub(crate) fn persistence(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Persistence(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
