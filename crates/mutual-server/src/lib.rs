//! HTTP server wiring for Mutual.
//!
//! Loads [`ServerConfig`], opens the SQLite store it names and wraps the
//! [`mutual_api`] router in request tracing.

use std::path::{Path, PathBuf};

use axum::Router;
use mutual_api::AppState;
use mutual_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// Store path that selects a throwaway in-memory database.
pub const IN_MEMORY: &str = ":memory:";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `MUTUAL_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

impl ServerConfig {
  /// Layer the optional TOML file at `path` and the environment over the
  /// built-in defaults.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    Self::from_builder(
      config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("MUTUAL")),
    )
  }

  fn from_builder(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
  ) -> Result<Self, config::ConfigError> {
    builder
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8080)?
      .set_default("store_path", "~/.local/share/mutual/mutual.db")?
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Store & router ───────────────────────────────────────────────────────────

/// Open the store named by `store_path`, creating parent directories for
/// on-disk databases.
pub async fn open_store(store_path: &Path) -> anyhow::Result<SqliteStore> {
  use anyhow::Context as _;

  if store_path.as_os_str() == IN_MEMORY {
    tracing::warn!("using an in-memory store; nothing will persist");
    return Ok(SqliteStore::open_in_memory().await?);
  }

  let path = expand_tilde(store_path);
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  SqliteStore::open(&path)
    .await
    .with_context(|| format!("failed to open store at {path:?}"))
}

/// The API router with request tracing.
pub fn router(state: AppState<SqliteStore>) -> Router {
  mutual_api::api_router(state).layer(TraceLayer::new_for_http())
}
