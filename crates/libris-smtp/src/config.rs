//! SMTP connection settings, deserialised from the server configuration.

use serde::Deserialize;

/// Default SMTP submission port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default bound on one SMTP exchange, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How the connection to the relay is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
  /// Plain connection upgraded with `STARTTLS` (usually port 587).
  #[default]
  Starttls,
  /// TLS from the first byte (usually port 465).
  Implicit,
  /// No encryption. Only for local relays and test servers.
  None,
}

/// Configuration for [`crate::SmtpMailer`].
///
/// ```toml
/// [mail.smtp]
/// host         = "smtp.example.edu"
/// port         = 587
/// tls          = "starttls"
/// from_address = "Library <library@example.edu>"
/// username     = "library"
/// password     = "..."
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
  pub host:         String,
  #[serde(default = "default_port")]
  pub port:         u16,
  #[serde(default)]
  pub tls:          TlsMode,
  /// RFC 5322 "From" mailbox, e.g. `Library <library@example.edu>`.
  pub from_address: String,
  pub username:     Option<String>,
  pub password:     Option<String>,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_port() -> u16 { DEFAULT_SMTP_PORT }

fn default_timeout_secs() -> u64 { DEFAULT_TIMEOUT_SECS }
