//! Translation of [`MailMessage`] into a `lettre` MIME message.

use lettre::{
  Message,
  message::{
    Mailbox, MultiPart,
    header::{Header, HeaderName, HeaderValue},
  },
};
use libris_core::mail::{MailMessage, Priority, Recipients};

use crate::Result;

// ─── X-Priority ──────────────────────────────────────────────────────────────

/// The de-facto `X-Priority` header (1 = highest, 3 = normal, 5 = lowest).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XPriority(pub Priority);

impl Header for XPriority {
  fn name() -> HeaderName { HeaderName::new_from_ascii_str("X-Priority") }

  fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
    let priority = match s.trim().chars().next() {
      Some('1' | '2') => Priority::High,
      Some('4' | '5') => Priority::Low,
      _ => Priority::Normal,
    };
    Ok(Self(priority))
  }

  fn display(&self) -> HeaderValue {
    let value = match self.0 {
      Priority::High => "1 (Highest)",
      Priority::Normal => "3 (Normal)",
      Priority::Low => "5 (Lowest)",
    };
    HeaderValue::new(Self::name(), value.to_owned())
  }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Assemble a `multipart/alternative` message for `recipients`.
///
/// Blind recipients go into `Bcc:` with the sender as the visible `To:`;
/// lettre moves `Bcc:` into the envelope and strips it from the headers.
pub fn build_message(
  from: &Mailbox,
  message: &MailMessage,
  recipients: &Recipients,
  message_id: &str,
) -> Result<Message> {
  let mut builder = Message::builder()
    .from(from.clone())
    .subject(message.subject.clone())
    .message_id(Some(message_id.to_owned()))
    .header(XPriority(message.priority));

  match recipients {
    Recipients::Direct(address) => {
      builder = builder.to(address.parse()?);
    }
    Recipients::Blind(addresses) => {
      builder = builder.to(from.clone());
      for address in addresses {
        builder = builder.bcc(address.parse()?);
      }
    }
  }

  let body = MultiPart::alternative_plain_html(message.rendered_text(), message.rendered_html());
  Ok(builder.multipart(body)?)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sender() -> Mailbox { "Library <library@example.edu>".parse().unwrap() }

  fn message(priority: Priority) -> MailMessage {
    MailMessage {
      subject:        "Library closed Friday".into(),
      text_body:      "See you Monday.".into(),
      html_body:      "<p>See you Monday.</p>".into(),
      attachment_url: Some("https://files.example.edu/notice.pdf".into()),
      priority,
    }
  }

  fn formatted(m: &Message) -> String { String::from_utf8_lossy(&m.formatted()).into_owned() }

  #[test]
  fn blind_recipients_are_enveloped_but_hidden() {
    let recipients = Recipients::Blind(vec![
      "a@example.edu".into(),
      "b@example.edu".into(),
    ]);
    let m = build_message(&sender(), &message(Priority::High), &recipients, "<x@example.edu>")
      .unwrap();

    let envelope: Vec<String> = m.envelope().to().iter().map(ToString::to_string).collect();
    assert!(envelope.contains(&"a@example.edu".to_string()));
    assert!(envelope.contains(&"b@example.edu".to_string()));

    let raw = formatted(&m);
    assert!(!raw.contains("Bcc:"));
    assert!(!raw.contains("a@example.edu"));
    assert!(raw.contains("To: Library <library@example.edu>"));
  }

  #[test]
  fn direct_recipient_is_visible() {
    let recipients = Recipients::Direct("ada@example.edu".into());
    let m = build_message(&sender(), &message(Priority::Normal), &recipients, "<x@example.edu>")
      .unwrap();

    let raw = formatted(&m);
    assert!(raw.contains("To: ada@example.edu"));
    assert!(raw.contains("X-Priority: 3 (Normal)"));
  }

  #[test]
  fn carries_id_priority_and_both_bodies() {
    let recipients = Recipients::Direct("ada@example.edu".into());
    let m = build_message(&sender(), &message(Priority::High), &recipients, "<abc@example.edu>")
      .unwrap();

    let raw = formatted(&m);
    assert!(raw.contains("Message-ID: <abc@example.edu>"));
    assert!(raw.contains("X-Priority: 1 (Highest)"));
    assert!(raw.contains("multipart/alternative"));
    assert!(raw.contains("text/plain"));
    assert!(raw.contains("text/html"));
    assert!(raw.contains("https://files.example.edu/notice.pdf"));
  }

  #[test]
  fn malformed_address_is_rejected() {
    let recipients = Recipients::Blind(vec!["not-an-address".into()]);
    let err = build_message(&sender(), &message(Priority::Low), &recipients, "<x@example.edu>")
      .unwrap_err();
    assert!(matches!(err, crate::Error::Address(_)));
  }

  #[test]
  fn priority_header_parses_back() {
    assert_eq!(XPriority::parse("1 (Highest)").unwrap(), XPriority(Priority::High));
    assert_eq!(XPriority::parse("5").unwrap(), XPriority(Priority::Low));
    assert_eq!(XPriority::parse("3 (Normal)").unwrap(), XPriority(Priority::Normal));
  }
}
