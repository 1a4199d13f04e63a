//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Statuses are chosen so a client can tell a bad scan (4xx) from a broken
//! backend (5xx) without parsing messages.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  /// The request was well-formed but the stored data cannot satisfy it.
  #[error("unprocessable: {0}")]
  Unprocessable(String),

  /// A backing service is misconfigured or unreachable.
  #[error("service unavailable: {0}")]
  Unavailable(String),

  #[error("delivery failed: {reason}")]
  DeliveryFailed {
    failed: Vec<String>,
    reason: String,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

impl From<libris_core::Error> for ApiError {
  fn from(e: libris_core::Error) -> Self {
    use libris_core::Error as E;

    match e {
      E::InvalidInput(m) => Self::BadRequest(m),
      e @ (E::PersonNotFound(_) | E::EventNotFound(_)) => Self::NotFound(e.to_string()),
      e @ E::IncompletePerson { .. } => Self::Unprocessable(e.to_string()),
      e @ E::DirectoryUnavailable(_) => Self::Unavailable(e.to_string()),
      E::Persistence(source) => Self::Store(source),
      E::DeliveryFailed { failed, reason } => Self::DeliveryFailed { failed, reason },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, json!({ "error": m })),
      ApiError::Unprocessable(m) => {
        (StatusCode::UNPROCESSABLE_ENTITY, json!({ "error": m }))
      }
      ApiError::Unavailable(m) => {
        (StatusCode::SERVICE_UNAVAILABLE, json!({ "error": m }))
      }
      ApiError::DeliveryFailed { failed, reason } => (
        StatusCode::BAD_GATEWAY,
        json!({ "error": format!("delivery failed: {reason}"), "failed": failed }),
      ),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store error");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": e.to_string() }))
      }
    };
    (status, Json(body)).into_response()
  }
}
