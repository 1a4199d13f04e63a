//! JSON REST API for libris attendance and mail.
//!
//! Exposes an axum [`Router`] backed by any store implementing the
//! [`libris_core::store`] traits and, optionally, any
//! [`libris_core::mail::MailTransport`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", libris_api::api_router(Arc::new(ApiContext::new(store, mailer))))
//! ```

pub mod attendance;
pub mod error;
pub mod mail;
pub mod people;

use std::{sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{delete, get, post},
};
use libris_core::{
  AttendanceRecorder, BulkMailer,
  mail::MailTransport,
  store::{EventStore, PersonRegistry},
};

pub use error::ApiError;

/// Everything the handlers share: the store, a recorder over it, and the
/// mailer when one is configured.
pub struct ApiContext<S, M> {
  pub store:    S,
  pub recorder: AttendanceRecorder<S, S>,
  pub mailer:   Option<Arc<BulkMailer<M>>>,
}

impl<S, M> ApiContext<S, M>
where
  S: PersonRegistry + EventStore + Clone,
  M: MailTransport,
{
  pub fn new(store: S, mailer: Option<BulkMailer<M>>) -> Self {
    Self {
      recorder: AttendanceRecorder::new(store.clone(), store.clone()),
      store,
      mailer: mailer.map(Arc::new),
    }
  }

  /// Bound every directory and event-store call made by the recorder.
  pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
    self.recorder = self.recorder.with_io_timeout(io_timeout);
    self
  }
}

/// State of the `/mail` routes, which only exist when a mailer does.
pub struct MailState<S, M> {
  pub ctx:    Arc<ApiContext<S, M>>,
  pub mailer: Arc<BulkMailer<M>>,
}

impl<S, M> Clone for MailState<S, M> {
  fn clone(&self) -> Self {
    Self { ctx: self.ctx.clone(), mailer: self.mailer.clone() }
  }
}

/// Build a fully-materialised API router for `ctx`.
///
/// The `/mail` routes are only mounted when `ctx.mailer` is set. The returned
/// `Router<()>` can be nested into any parent router regardless of its own
/// state type.
pub fn api_router<S, M>(ctx: Arc<ApiContext<S, M>>) -> Router<()>
where
  S: PersonRegistry + EventStore + Clone + 'static,
  M: MailTransport + 'static,
{
  let mut router = Router::new()
    // People
    .route("/people", get(people::list::<S, M>).post(people::create::<S, M>))
    .route("/people/{code}", get(people::get_one::<S, M>))
    // Attendance
    .route("/attendance", get(attendance::log::<S, M>))
    .route("/attendance/scan", post(attendance::scan::<S, M>))
    .route("/attendance/status/{code}", get(attendance::status::<S, M>))
    .route("/attendance/{id}", delete(attendance::delete_one::<S, M>))
    .with_state(ctx.clone());

  if let Some(mailer) = ctx.mailer.clone() {
    router = router.merge(
      Router::new()
        .route("/mail/announcements", post(mail::announce::<S, M>))
        .route("/mail/registration", post(mail::registration::<S, M>))
        .with_state(MailState { ctx, mailer }),
    );
  }

  router
}

#[cfg(test)]
mod tests;
