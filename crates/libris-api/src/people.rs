//! Handlers for `/people` routes.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use libris_core::{
  mail::{MailTransport, MessageId},
  person::{NewPerson, Person},
  store::{EventStore, PersonDirectory, PersonRegistry},
};
use serde::{Deserialize, Serialize};

use crate::{ApiContext, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  #[serde(flatten)]
  pub person: NewPerson,
  /// Send a registration confirmation to the person's email, if any.
  #[serde(default)]
  pub notify: bool,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
  pub person:       Person,
  /// Set when a confirmation went out; `null` when none was requested or
  /// delivery failed.
  pub confirmation: Option<MessageId>,
}

/// `GET /people`
pub async fn list<S, M>(
  State(ctx): State<Arc<ApiContext<S, M>>>,
) -> Result<Json<Vec<Person>>, ApiError>
where
  S: PersonRegistry + EventStore,
  M: MailTransport,
{
  let people = ctx.store.list_people().await.map_err(ApiError::store)?;
  Ok(Json(people))
}

/// `GET /people/{code}`
pub async fn get_one<S, M>(
  State(ctx): State<Arc<ApiContext<S, M>>>,
  Path(code): Path<String>,
) -> Result<Json<Person>, ApiError>
where
  S: PersonRegistry + EventStore,
  M: MailTransport,
{
  Ok(Json(ctx.recorder.resolve_person(code.trim()).await?))
}

/// `POST /people`
pub async fn create<S, M>(
  State(ctx): State<Arc<ApiContext<S, M>>>,
  Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError>
where
  S: PersonRegistry + EventStore,
  M: MailTransport,
{
  let mut input = body.person;
  input.code = input.code.trim().to_owned();
  if input.code.is_empty() {
    return Err(ApiError::BadRequest("code is required".into()));
  }

  let code = input.code.clone();
  let person = ctx.store.register(input).await.map_err(|e| {
    if S::is_conflict(&e) {
      ApiError::Conflict(format!("code {code} is already registered"))
    } else {
      ApiError::store(e)
    }
  })?;
  tracing::info!(code = %person.code, person_id = %person.person_id, "person registered");

  let mut confirmation = None;
  if body.notify {
    match (&ctx.mailer, person.email.as_deref().filter(|e| !e.trim().is_empty())) {
      (Some(mailer), Some(address)) => {
        match mailer.send_registration_confirmation(address, &person).await {
          Ok(id) => confirmation = Some(id),
          Err(e) => tracing::warn!(code = %person.code, error = %e, "registration confirmation failed"),
        }
      }
      (None, _) => tracing::debug!(code = %person.code, "no mailer configured; confirmation skipped"),
      (_, None) => tracing::debug!(code = %person.code, "no email on file; confirmation skipped"),
    }
  }

  Ok((StatusCode::CREATED, Json(RegisterResponse { person, confirmation })))
}
