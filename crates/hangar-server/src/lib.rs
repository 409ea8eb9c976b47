//! Configuration and wiring for the Hangar server binary.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use axum::Router;
use hangar_api::{AppState, api_router};
use hangar_fleet::UPLOAD_COOLDOWN;
use hangar_http::{GalaxyClient, RsiDirectoryClient};
use hangar_store_sqlite::SqliteStore;
use serde::Deserialize;
use tracing::{info, warn};

/// Runtime server configuration, deserialised from `config.toml` and
/// `HANGAR_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  pub store_path:           PathBuf,
  /// Base URL of the citizen directory.
  pub directory_url:        String,
  /// Base URL of the ship catalog.
  pub catalog_url:          String,
  pub upload_cooldown_secs: Option<u64>,
  pub http_timeout_secs:    Option<u64>,
}

impl ServerConfig {
  /// Layer `path` (optional) under the `HANGAR_` environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("HANGAR"))
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn upload_cooldown(&self) -> Duration {
    self
      .upload_cooldown_secs
      .map_or(UPLOAD_COOLDOWN, Duration::from_secs)
  }

  pub fn http_timeout(&self) -> Duration {
    Duration::from_secs(self.http_timeout_secs.unwrap_or(30))
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Open the store, build both upstream clients and return the router.
///
/// The ship catalog is warmed in the background; a failure there only means
/// the first exports fetch it on demand.
pub async fn build_app(cfg: &ServerConfig) -> anyhow::Result<Router> {
  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let timeout = cfg.http_timeout();
  let directory = RsiDirectoryClient::new(&cfg.directory_url, timeout)
    .context("invalid directory_url")?;
  let catalog =
    GalaxyClient::new(&cfg.catalog_url, timeout).context("invalid catalog_url")?;

  let state = AppState::new(Arc::new(store), directory, catalog, cfg.upload_cooldown());
  info!(cooldown = ?cfg.upload_cooldown(), "upload cooldown");

  let cache = state.catalog.clone();
  tokio::spawn(async move {
    if let Err(e) = cache.refresh().await {
      warn!(error = %e, "could not warm the ship catalog");
    }
  });

  Ok(api_router(state))
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

#[cfg(test)]
mod tests {
  use config::{File, FileFormat};

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  const MINIMAL: &str = r#"
    host = "127.0.0.1"
    port = 8080
    store_path = ":memory:"
    directory_url = "http://directory.local/"
    catalog_url = "http://catalog.local/"
  "#;

  #[test]
  fn optional_settings_fall_back_to_defaults() {
    let cfg = parse(MINIMAL);
    assert_eq!(cfg.upload_cooldown(), UPLOAD_COOLDOWN);
    assert_eq!(cfg.http_timeout(), Duration::from_secs(30));
    assert_eq!(cfg.address(), "127.0.0.1:8080");
  }

  #[test]
  fn cooldown_is_configurable() {
    let cfg = parse(&format!("{MINIMAL}\nupload_cooldown_secs = 60\nhttp_timeout_secs = 5"));
    assert_eq!(cfg.upload_cooldown(), Duration::from_secs(60));
    assert_eq!(cfg.http_timeout(), Duration::from_secs(5));
  }

  #[test]
  fn tilde_only_expands_as_a_prefix() {
    assert_eq!(expand_tilde(Path::new("/var/hangar.db")), PathBuf::from("/var/hangar.db"));
    assert_eq!(expand_tilde(Path::new("a/~/b")), PathBuf::from("a/~/b"));
  }

  #[tokio::test]
  async fn app_builds_over_an_in_memory_store() {
    assert!(build_app(&parse(MINIMAL)).await.is_ok());
  }

  #[tokio::test]
  async fn invalid_upstream_url_is_rejected() {
    let cfg = parse(&MINIMAL.replace("http://catalog.local/", "not a url"));
    assert!(build_app(&cfg).await.is_err());
  }
}
