//! libris server binary.
//!
//! ```text
//! libris-server [--config FILE]     serve the attendance and mail API
//! libris-server --hash-password     print an argon2 hash for the config
//! ```
//!
//! Settings come from the TOML file, overridden by `LIBRIS_*` variables
//! (e.g. `LIBRIS_MAIL__SMTP__PASSWORD`).

use std::{
  io::{self, BufRead, Write},
  path::PathBuf,
};

use clap::Parser;
use libris_server::{ServerConfig, auth::hash_password};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Library attendance and mail server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Read a password from stdin, print its hash for `auth_password_hash`,
  /// and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  if cli.hash_password {
    eprint!("Password: ");
    io::stderr().flush().ok();
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let hash = hash_password(line.trim_end_matches(['\r', '\n']))
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  libris_server::serve(ServerConfig::load(&cli.config)?).await
}
