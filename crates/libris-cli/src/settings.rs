//! Layered client settings.
//!
//! Later sources win: built-in defaults, the TOML file, `LIBRIS_*`
//! environment variables, then command-line flags.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use libris_client::{GatewayConfig, gateway::DEFAULT_BASE_URL};
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "~/.config/libris/config.toml";
const DEFAULT_STORE_PATH: &str = "~/.local/share/libris/session.db";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  #[serde(default = "default_api_url")]
  pub api_url:              String,
  /// Where the login credential is persisted between runs.
  #[serde(default = "default_store_path")]
  pub store_path:           PathBuf,
  #[serde(default)]
  pub request_timeout_secs: Option<u64>,
}

fn default_api_url() -> String { DEFAULT_BASE_URL.to_owned() }

fn default_store_path() -> PathBuf { PathBuf::from(DEFAULT_STORE_PATH) }

/// Values given on the command line.
#[derive(Debug, Default)]
pub struct Overrides {
  pub api_url:    Option<String>,
  pub store_path: Option<PathBuf>,
}

impl Settings {
  pub fn load(file: &Path, overrides: Overrides) -> anyhow::Result<Self> {
    let mut builder = config::Config::builder()
      .add_source(config::File::from(expand_tilde(file)).required(false))
      .add_source(config::Environment::with_prefix("LIBRIS").try_parsing(true));

    if let Some(url) = overrides.api_url {
      builder = builder.set_override("api_url", url)?;
    }
    if let Some(path) = overrides.store_path {
      builder = builder.set_override("store_path", path.to_string_lossy().into_owned())?;
    }

    let settings: Self = builder
      .build()
      .with_context(|| format!("failed to read config file {}", file.display()))?
      .try_deserialize()
      .context("failed to deserialise settings")?;

    Ok(Self {
      store_path: expand_tilde(&settings.store_path),
      ..settings
    })
  }

  pub fn gateway_config(&self) -> GatewayConfig {
    GatewayConfig {
      base_url:        self.api_url.clone(),
      request_timeout: self.request_timeout_secs.map(Duration::from_secs),
    }
  }
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
