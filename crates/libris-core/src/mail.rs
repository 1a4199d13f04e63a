//! Bulk and transactional mail delivery.
//!
//! [`BulkMailer`] splits a recipient list into blind-copied batches, sends
//! each batch through a [`MailTransport`], and folds the per-batch results
//! into one [`DeliveryOutcome`]. A failing batch never stops the rest; the
//! call only fails outright when every recipient failed.

use std::{future::Future, time::Duration};

use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::{Error, Result, person::Person};

/// Default number of addresses per blind-copied batch.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Default bound on a single transport call.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

// ─── Message ─────────────────────────────────────────────────────────────────

/// Delivery priority, mapped onto the `X-Priority` header by transports.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
  High,
  #[default]
  Normal,
  Low,
}

/// A message as handed to a transport. Built per request, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
  pub subject:        String,
  pub text_body:      String,
  pub html_body:      String,
  /// Link to a hosted attachment; no binary content travels with the message.
  pub attachment_url: Option<String>,
  #[serde(default)]
  pub priority:       Priority,
}

impl MailMessage {
  /// Plain-text body with the attachment link appended, if any.
  pub fn rendered_text(&self) -> String {
    match &self.attachment_url {
      Some(url) => format!("{}\n\nAttachment: {url}\n", self.text_body),
      None => self.text_body.clone(),
    }
  }

  /// HTML body with the attachment link appended, if any.
  pub fn rendered_html(&self) -> String {
    match &self.attachment_url {
      Some(url) => {
        let url = escape(url.as_str());
        format!(
          "{}\n<p>Attachment: <a href=\"{url}\">{url}</a></p>",
          self.html_body
        )
      }
      None => self.html_body.clone(),
    }
  }
}

/// Opaque identifier a transport assigns to an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl std::fmt::Display for MessageId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

/// Who receives one transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
  /// A single visible `To:` address.
  Direct(String),
  /// Addresses hidden from each other in `Bcc:`.
  Blind(Vec<String>),
}

impl Recipients {
  pub fn addresses(&self) -> Vec<String> {
    match self {
      Self::Direct(a) => vec![a.clone()],
      Self::Blind(list) => list.clone(),
    }
  }
}

// ─── Transport ───────────────────────────────────────────────────────────────

/// Abstraction over an outgoing mail service (e.g. `libris-smtp`).
///
/// Any failure (auth, network, rejected recipient, rate limit) is a single
/// undistinguished error at this layer.
pub trait MailTransport: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn send<'a>(
    &'a self,
    message: &'a MailMessage,
    recipients: &'a Recipients,
  ) -> impl Future<Output = Result<MessageId, Self::Error>> + Send + 'a;
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
  Delivered,
  Partial,
}

/// The aggregate result of a bulk send that reached at least one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
  pub total:       usize,
  pub delivered:   usize,
  pub failed:      Vec<String>,
  pub batches:     usize,
  pub message_ids: Vec<MessageId>,
}

impl DeliveryOutcome {
  pub fn status(&self) -> DeliveryStatus {
    if self.failed.is_empty() {
      DeliveryStatus::Delivered
    } else {
      DeliveryStatus::Partial
    }
  }

  pub fn is_partial(&self) -> bool { self.status() == DeliveryStatus::Partial }
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// A broadcast to many recipients.
#[derive(Debug, Clone, Deserialize)]
pub struct Announcement {
  pub subject:        String,
  pub html_body:      String,
  pub text_body:      String,
  pub attachment_url: Option<String>,
}

// ─── Mailer ──────────────────────────────────────────────────────────────────

/// Batched, failure-tolerant sender over a [`MailTransport`].
#[derive(Debug, Clone)]
pub struct BulkMailer<T> {
  transport:    T,
  batch_size:   usize,
  send_timeout: Duration,
}

impl<T: MailTransport> BulkMailer<T> {
  pub fn new(transport: T) -> Self {
    Self {
      transport,
      batch_size: DEFAULT_BATCH_SIZE,
      send_timeout: DEFAULT_SEND_TIMEOUT,
    }
  }

  pub fn with_batch_size(mut self, batch_size: usize) -> Self {
    self.batch_size = batch_size;
    self
  }

  pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
    self.send_timeout = send_timeout;
    self
  }

  pub fn transport(&self) -> &T { &self.transport }

  pub fn batch_size(&self) -> usize { self.batch_size }

  /// One bounded transport call; timeouts are reported as failures.
  async fn attempt(
    &self,
    message: &MailMessage,
    recipients: &Recipients,
  ) -> Result<MessageId, String> {
    match tokio::time::timeout(self.send_timeout, self.transport.send(message, recipients)).await {
      Ok(Ok(id)) => Ok(id),
      Ok(Err(e)) => Err(e.to_string()),
      Err(_) => Err(format!("no response within {:?}", self.send_timeout)),
    }
  }

  /// Deliver `message` to every address in `recipients`, `batch_size`
  /// addresses per blind-copied send, in order.
  ///
  /// Blank addresses are skipped. A batch that fails marks all of its
  /// addresses failed and the remaining batches still go out. Returns
  /// [`Error::DeliveryFailed`] only when no recipient was reached.
  pub async fn send_to_many(
    &self,
    message: &MailMessage,
    recipients: &[String],
  ) -> Result<DeliveryOutcome> {
    if self.batch_size == 0 {
      return Err(Error::InvalidInput("batch size must be at least 1".into()));
    }

    let addresses: Vec<String> = recipients
      .iter()
      .map(|a| a.trim())
      .filter(|a| !a.is_empty())
      .map(str::to_owned)
      .collect();

    if addresses.is_empty() {
      return Err(Error::InvalidInput("no recipients".into()));
    }

    let mut outcome = DeliveryOutcome {
      total:       addresses.len(),
      delivered:   0,
      failed:      Vec::new(),
      batches:     0,
      message_ids: Vec::new(),
    };
    let mut last_error = None;

    for (index, batch) in addresses.chunks(self.batch_size).enumerate() {
      outcome.batches += 1;
      let recipients = Recipients::Blind(batch.to_vec());

      match self.attempt(message, &recipients).await {
        Ok(id) => {
          outcome.delivered += batch.len();
          outcome.message_ids.push(id);
        }
        Err(reason) => {
          tracing::warn!(
            batch = index,
            size = batch.len(),
            error = %reason,
            "mail batch failed"
          );
          outcome.failed.extend_from_slice(batch);
          last_error = Some(reason);
        }
      }
    }

    if outcome.delivered == 0 {
      return Err(Error::DeliveryFailed {
        failed: outcome.failed,
        reason: last_error.unwrap_or_else(|| "all batches failed".into()),
      });
    }

    tracing::info!(
      subject = %message.subject,
      total = outcome.total,
      delivered = outcome.delivered,
      failed = outcome.failed.len(),
      batches = outcome.batches,
      "bulk mail sent"
    );
    Ok(outcome)
  }

  /// Deliver `message` straight to one visible address.
  pub async fn send_single(&self, message: &MailMessage, address: &str) -> Result<MessageId> {
    let address = address.trim();
    if address.is_empty() {
      return Err(Error::InvalidInput("recipient address is empty".into()));
    }

    let recipients = Recipients::Direct(address.to_owned());
    let id = self
      .attempt(message, &recipients)
      .await
      .map_err(|reason| Error::DeliveryFailed {
        failed: vec![address.to_owned()],
        reason,
      })?;

    tracing::info!(to = address, subject = %message.subject, message_id = %id, "mail sent");
    Ok(id)
  }

  /// Broadcast an announcement at high priority.
  pub async fn send_announcement(
    &self,
    announcement: Announcement,
    recipients: &[String],
  ) -> Result<DeliveryOutcome> {
    if announcement.subject.trim().is_empty() {
      return Err(Error::InvalidInput("announcement subject is empty".into()));
    }

    let message = MailMessage {
      subject:        announcement.subject,
      text_body:      announcement.text_body,
      html_body:      announcement.html_body,
      attachment_url: announcement.attachment_url.filter(|u| !u.trim().is_empty()),
      priority:       Priority::High,
    };
    self.send_to_many(&message, recipients).await
  }

  /// Tell a newly registered person their registration went through.
  pub async fn send_registration_confirmation(
    &self,
    address: &str,
    person: &Person,
  ) -> Result<MessageId> {
    self.send_single(&registration_message(person), address).await
  }
}

// ─── Templates ───────────────────────────────────────────────────────────────

/// The registration confirmation sent to new people.
pub fn registration_message(person: &Person) -> MailMessage {
  let name = person.name.as_deref().unwrap_or("there");
  let student_id = person.student_id.as_deref().unwrap_or("-");
  let group = person.group.as_deref().unwrap_or("-");

  let text_body = format!(
    "Hello {name},\n\n\
     Your library registration is complete.\n\n\
     Student ID: {student_id}\n\
     Course/Section: {group}\n\
     Library card code: {code}\n\n\
     Present your library card when entering the library.\n",
    code = person.code,
  );

  let html_body = format!(
    "<p>Hello {name},</p>\
     <p>Your library registration is complete.</p>\
     <table>\
     <tr><td>Student ID</td><td>{student_id}</td></tr>\
     <tr><td>Course/Section</td><td>{group}</td></tr>\
     <tr><td>Library card code</td><td>{code}</td></tr>\
     </table>\
     <p>Present your library card when entering the library.</p>",
    name = escape(name),
    student_id = escape(student_id),
    group = escape(group),
    code = escape(person.code.as_str()),
  );

  MailMessage {
    subject: "Library registration confirmed".into(),
    text_body,
    html_body,
    attachment_url: None,
    priority: Priority::Normal,
  }
}
