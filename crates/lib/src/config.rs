//! Run-time configuration that is not part of the build selection.
//!
//! Defaults can be overridden through `LMPCROSS_*` environment variables.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::consts::{DEFAULT_SOURCE_URL, DEFAULT_THIRDPARTY_URL, ENV_PREFIX, PATCH_DIR_NAME};
use crate::options::parse_switch;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  #[error("invalid value '{value}' for {var}: expected yes or no")]
  InvalidSwitch { var: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
  /// Base URL for third-party archives and helper executables.
  pub thirdparty_url: String,
  /// Base URL for `<revision>.tar.gz` source archives.
  pub source_url: String,
  /// Directory searched for `<component>.patch` files.
  pub patch_dir: PathBuf,
  /// Remove the build directory after a fully successful run.
  pub cleanup: bool,
}

impl BuildConfig {
  /// Built-in defaults for an executable living in `home`.
  pub fn new(home: &Path) -> Self {
    Self {
      thirdparty_url: DEFAULT_THIRDPARTY_URL.to_string(),
      source_url: DEFAULT_SOURCE_URL.to_string(),
      patch_dir: home.join(PATCH_DIR_NAME),
      cleanup: false,
    }
  }

  /// Defaults with environment overrides applied.
  pub fn from_env(home: &Path) -> Result<Self, ConfigError> {
    let mut config = Self::new(home);

    if let Some(url) = env_var("THIRDPARTY_URL") {
      config.thirdparty_url = url.trim_end_matches('/').to_string();
    }
    if let Some(url) = env_var("SOURCE_URL") {
      config.source_url = url.trim_end_matches('/').to_string();
    }
    if let Some(dir) = env_var("PATCH_DIR") {
      config.patch_dir = PathBuf::from(dir);
    }
    if let Some(value) = env_var("CLEANUP") {
      config.cleanup = parse_switch(&value).ok_or_else(|| ConfigError::InvalidSwitch {
        var: format!("{ENV_PREFIX}CLEANUP"),
        value,
      })?;
    }

    Ok(config)
  }
}

fn env_var(suffix: &str) -> Option<String> {
  std::env::var(format!("{ENV_PREFIX}{suffix}"))
    .ok()
    .filter(|value| !value.is_empty())
}
