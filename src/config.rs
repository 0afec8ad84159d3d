//! Embedding-host configuration.
//!
//! The cache name and precache manifest are compile-time constants (see
//! [`crate::manifest`]); this covers only what varies per host: the origin
//! requests resolve against, the network timeout, and where the persistent
//! store lives.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Network timeout applied to each individual fetch.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_timeout_secs() -> u64 {
  DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  /// Origin the controlled page is served from. Site-relative manifest
  /// locators and intercepted paths resolve against it.
  pub origin: String,

  /// Timeout for individual network fetches, in seconds.
  #[serde(default = "default_timeout_secs")]
  pub request_timeout_secs: u64,

  /// Directory holding persistent cache stores. Platform data directory
  /// when unset.
  #[serde(default)]
  pub cache_dir: Option<PathBuf>,
}

impl Config {
  /// Configuration for a host at `origin`, defaults everywhere else.
  pub fn for_origin(origin: impl Into<String>) -> Self {
    Self {
      origin: origin.into(),
      request_timeout_secs: DEFAULT_TIMEOUT_SECS,
      cache_dir: None,
    }
  }

  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./offcache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/offcache/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(ConfigError::NotFound {
          path: p.to_path_buf(),
        });
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(ConfigError::NoneFound),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("offcache.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("offcache").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
      path: path.to_path_buf(),
      source: e,
    })?;

    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
      path: path.to_path_buf(),
      source: e,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn minimal_yaml_gets_defaults() {
    let config: Config = serde_yaml::from_str("origin: https://spese.example.net\n").unwrap();

    assert_eq!(config.origin, "https://spese.example.net");
    assert_eq!(config.request_timeout_secs, 30);
    assert!(config.cache_dir.is_none());
  }

  #[test]
  fn explicit_fields_override_defaults() {
    let yaml = "origin: https://spese.example.net\nrequest_timeout_secs: 5\ncache_dir: /tmp/offcache\n";
    let config: Config = serde_yaml::from_str(yaml).unwrap();

    assert_eq!(config.request_timeout_secs, 5);
    assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/offcache")));
  }

  #[test]
  fn load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("offcache.yaml");
    std::fs::write(&path, "origin: https://spese.example.net\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.origin, "https://spese.example.net");
  }

  #[test]
  fn missing_explicit_path_is_an_error() {
    let missing = Path::new("/definitely/not/here.yaml");
    assert!(matches!(
      Config::load(Some(missing)),
      Err(ConfigError::NotFound { .. })
    ));
  }
}
