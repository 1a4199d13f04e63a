//! [`SmtpMailer`]: the `lettre` implementation of [`MailTransport`].

use std::time::Duration;

use lettre::{
  AsyncSmtpTransport, AsyncTransport, Tokio1Executor, message::Mailbox,
  transport::smtp::authentication::Credentials,
};
use libris_core::mail::{MailMessage, MailTransport, MessageId, Recipients};
use uuid::Uuid;

use crate::{
  Error, Result,
  config::{SmtpConfig, TlsMode},
  message::build_message,
};

/// Sends libris mail through an SMTP relay.
///
/// The underlying transport is built once and reused for every send.
pub struct SmtpMailer {
  transport: AsyncSmtpTransport<Tokio1Executor>,
  from:      Mailbox,
}

impl SmtpMailer {
  /// Build a mailer from `config`. No connection is opened until the first
  /// send.
  pub fn new(config: &SmtpConfig) -> Result<Self> {
    let from: Mailbox = config.from_address.parse()?;

    let builder = match config.tls {
      TlsMode::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?,
      TlsMode::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?,
      TlsMode::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
    };

    let mut builder = builder
      .port(config.port)
      .timeout(Some(Duration::from_secs(config.timeout_secs)));

    if let (Some(user), Some(pass)) = (&config.username, &config.password) {
      builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
    }

    Ok(Self { transport: builder.build(), from })
  }

  /// The sender mailbox every message goes out as.
  pub fn from(&self) -> &Mailbox { &self.from }

  fn next_message_id(&self) -> String {
    format!("<{}@{}>", Uuid::new_v4(), self.from.email.domain())
  }
}

impl MailTransport for SmtpMailer {
  type Error = Error;

  async fn send<'a>(
    &'a self,
    message: &'a MailMessage,
    recipients: &'a Recipients,
  ) -> Result<MessageId> {
    let message_id = self.next_message_id();
    let email = build_message(&self.from, message, recipients, &message_id)?;

    self.transport.send(email).await?;

    tracing::debug!(
      message_id = %message_id,
      subject = %message.subject,
      recipients = recipients.addresses().len(),
      "smtp message accepted"
    );
    Ok(MessageId(message_id))
  }
}

#[cfg(test)]
mod tests {
  use libris_core::mail::Priority;

  use super::*;

  fn config(tls: TlsMode, port: u16) -> SmtpConfig {
    SmtpConfig {
      host:         "127.0.0.1".into(),
      port,
      tls,
      from_address: "Library <library@example.edu>".into(),
      username:     None,
      password:     None,
      timeout_secs: 2,
    }
  }

  #[test]
  fn rejects_unparseable_sender() {
    let mut cfg = config(TlsMode::None, 2525);
    cfg.from_address = "library at example".into();
    assert!(matches!(SmtpMailer::new(&cfg), Err(Error::Address(_))));
  }

  #[test]
  fn message_ids_use_sender_domain() {
    let mailer = SmtpMailer::new(&config(TlsMode::None, 2525)).unwrap();
    let id = mailer.next_message_id();
    assert!(id.starts_with('<'));
    assert!(id.ends_with("@example.edu>"));
    assert_ne!(id, mailer.next_message_id());
  }

  #[tokio::test]
  async fn unreachable_relay_is_a_transport_error() {
    // Port 1 on loopback has nothing listening; the connect is refused.
    let mailer = SmtpMailer::new(&config(TlsMode::None, 1)).unwrap();
    let message = MailMessage {
      subject:        "hello".into(),
      text_body:      "hello".into(),
      html_body:      "<p>hello</p>".into(),
      attachment_url: None,
      priority:       Priority::Normal,
    };

    let err = mailer
      .send(&message, &Recipients::Direct("ada@example.edu".into()))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
  }
}
