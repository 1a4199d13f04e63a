//! SMTP delivery for libris mail, built on the `lettre` async transport.
//!
//! [`SmtpMailer`] implements [`libris_core::mail::MailTransport`], so it can be
//! dropped into a [`libris_core::BulkMailer`] for batched announcements.

mod message;
mod transport;

pub mod config;
pub mod error;

pub use config::{SmtpConfig, TlsMode};
pub use error::{Error, Result};
pub use transport::SmtpMailer;
