//! Core types and trait definitions for the libris attendance and mail core.
//!
//! This crate is deliberately free of HTTP, database and SMTP dependencies.
//! Backends implement the collaborator traits in [`store`] and [`mail`];
//! everything else depends on this crate.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod attendance;
pub mod error;
pub mod event;
pub mod mail;
pub mod person;
pub mod status;
pub mod store;

pub use attendance::AttendanceRecorder;
pub use error::{Error, Result};
pub use mail::BulkMailer;
