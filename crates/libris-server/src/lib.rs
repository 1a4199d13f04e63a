//! HTTP server for libris.
//!
//! Wires the SQLite store, the optional SMTP mailer, and the JSON API into a
//! single axum [`Router`] with Basic auth in front of `/api`.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use axum::{Router, middleware, routing::get};
use libris_api::{ApiContext, api_router};
use libris_core::{
  BulkMailer,
  attendance::DEFAULT_IO_TIMEOUT,
  mail::{DEFAULT_BATCH_SIZE, DEFAULT_SEND_TIMEOUT, MailTransport},
  store::{EventStore, PersonRegistry},
};
use libris_smtp::{SmtpConfig, SmtpMailer};
use libris_store_sqlite::SqliteStore;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_auth};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  pub auth_username:      String,
  pub auth_password_hash: String,
  /// Bound on each directory or event-store call made while scanning.
  #[serde(default = "default_io_timeout_secs")]
  pub io_timeout_secs:    u64,
  /// Outgoing mail. The `/api/mail` routes are disabled when absent.
  pub mail:               Option<MailSettings>,
}

#[derive(Deserialize, Clone)]
pub struct MailSettings {
  pub smtp:              SmtpConfig,
  #[serde(default = "default_batch_size")]
  pub batch_size:        usize,
  #[serde(default = "default_send_timeout_secs")]
  pub send_timeout_secs: u64,
}

fn default_io_timeout_secs() -> u64 { DEFAULT_IO_TIMEOUT.as_secs() }

fn default_batch_size() -> usize { DEFAULT_BATCH_SIZE }

fn default_send_timeout_secs() -> u64 { DEFAULT_SEND_TIMEOUT.as_secs() }

impl ServerConfig {
  /// Load from the TOML file at `path` (optional) layered under `LIBRIS_*`
  /// environment variables. Nested keys use `__`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("LIBRIS").separator("__"))
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  /// `store_path` with a leading `~/` expanded to `$HOME`.
  pub fn resolved_store_path(&self) -> PathBuf {
    let raw = self.store_path.to_string_lossy();
    match (raw.strip_prefix("~/"), std::env::var_os("HOME")) {
      (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
      _ => self.store_path.clone(),
    }
  }

  pub fn auth(&self) -> AuthConfig {
    AuthConfig {
      username:      self.auth_username.clone(),
      password_hash: self.auth_password_hash.clone(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// The API context the server binary runs with.
pub type ServerContext = ApiContext<SqliteStore, SmtpMailer>;

/// Open the store at `store_path` and build the mailer, if configured.
pub async fn open_context(config: &ServerConfig, store_path: &Path) -> anyhow::Result<ServerContext> {
  let store = SqliteStore::open(store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let mailer = match &config.mail {
    Some(settings) => {
      let smtp = SmtpMailer::new(&settings.smtp).context("invalid SMTP configuration")?;
      tracing::info!(
        host = %settings.smtp.host,
        from = %smtp.from(),
        batch_size = settings.batch_size,
        "mail enabled"
      );
      Some(
        BulkMailer::new(smtp)
          .with_batch_size(settings.batch_size)
          .with_send_timeout(Duration::from_secs(settings.send_timeout_secs)),
      )
    }
    None => {
      tracing::info!("mail disabled; no [mail] section configured");
      None
    }
  };

  Ok(
    ApiContext::new(store, mailer)
      .with_io_timeout(Duration::from_secs(config.io_timeout_secs)),
  )
}

/// Open everything `config` describes and serve until the listener fails.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
  let store_path = config.resolved_store_path();
  if let Some(dir) = store_path.parent().filter(|d| !d.as_os_str().is_empty()) {
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {dir:?}"))?;
  }

  let ctx = open_context(&config, &store_path).await?;
  let app = router(Arc::new(ctx), config.auth());

  let address = format!("{}:{}", config.host, config.port);
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!(store = ?store_path, %address, "libris listening");

  axum::serve(listener, app).await.context("server error")
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the top-level router: `/health` is open, everything under `/api`
/// requires Basic auth.
pub fn router<S, M>(ctx: Arc<ApiContext<S, M>>, auth: AuthConfig) -> Router
where
  S: PersonRegistry + EventStore + Clone + 'static,
  M: MailTransport + 'static,
{
  let api = api_router(ctx)
    .route_layer(middleware::from_fn_with_state(Arc::new(auth), require_auth));

  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}
