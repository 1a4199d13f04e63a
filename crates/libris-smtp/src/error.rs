//! Error type for `libris-smtp`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// SMTP transport-level failure (authentication, connection, rejection).
  #[error("SMTP transport error: {0}")]
  Transport(#[from] lettre::transport::smtp::Error),

  /// A recipient or sender address could not be parsed.
  #[error("email address parse error: {0}")]
  Address(#[from] lettre::address::AddressError),

  /// The MIME message could not be assembled.
  #[error("email build error: {0}")]
  Build(#[from] lettre::error::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
