//! Handlers for `/mail` routes. Only mounted when a mailer is configured.

use axum::{Json, extract::State};
use libris_core::{
  mail::{Announcement, DeliveryOutcome, DeliveryStatus, MailTransport, MessageId},
  store::{EventStore, PersonDirectory, PersonRegistry},
};
use serde::{Deserialize, Serialize};

use crate::{MailState, error::ApiError};

/// Who an announcement goes to.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecipientSelection {
  Single { address: String },
  List { addresses: Vec<String> },
  /// Every registered person with an email on file.
  All,
}

#[derive(Debug, Deserialize)]
pub struct AnnouncementBody {
  #[serde(flatten)]
  pub announcement: Announcement,
  pub recipients:   RecipientSelection,
}

#[derive(Debug, Serialize)]
pub struct AnnouncementResponse {
  pub status:  DeliveryStatus,
  #[serde(flatten)]
  pub outcome: DeliveryOutcome,
}

#[derive(Debug, Deserialize)]
pub struct RegistrationBody {
  pub code:    String,
  /// Overrides the email on file.
  pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SentResponse {
  pub message_id: MessageId,
}

/// `POST /mail/announcements`
pub async fn announce<S, M>(
  State(MailState { ctx, mailer }): State<MailState<S, M>>,
  Json(body): Json<AnnouncementBody>,
) -> Result<Json<AnnouncementResponse>, ApiError>
where
  S: PersonRegistry + EventStore,
  M: MailTransport,
{
  let addresses = match body.recipients {
    RecipientSelection::Single { address } => vec![address],
    RecipientSelection::List { addresses } => addresses,
    RecipientSelection::All => PersonDirectory::list_people(&ctx.store)
      .await
      .map_err(ApiError::store)?
      .into_iter()
      .filter_map(|p| p.email)
      .filter(|e| !e.trim().is_empty())
      .collect(),
  };

  let outcome = mailer.send_announcement(body.announcement, &addresses).await?;
  Ok(Json(AnnouncementResponse { status: outcome.status(), outcome }))
}

/// `POST /mail/registration`
pub async fn registration<S, M>(
  State(MailState { ctx, mailer }): State<MailState<S, M>>,
  Json(body): Json<RegistrationBody>,
) -> Result<Json<SentResponse>, ApiError>
where
  S: PersonRegistry + EventStore,
  M: MailTransport,
{
  let person = ctx.recorder.resolve_person(body.code.trim()).await?;

  let address = body
    .address
    .or_else(|| person.email.clone())
    .filter(|a| !a.trim().is_empty())
    .ok_or_else(|| ApiError::BadRequest(format!("person {} has no email on file", person.code)))?;

  let message_id = mailer.send_registration_confirmation(&address, &person).await?;
  Ok(Json(SentResponse { message_id }))
}
