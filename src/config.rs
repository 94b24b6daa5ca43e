use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Versioned base URL, e.g. "https://api.example.com/v1"
  pub base_url: String,
  /// Per-request timeout in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Bounded automatic retries for a failed fetch (immediate re-issue)
  #[serde(default = "default_retry_limit")]
  pub retry_limit: u32,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      retry_limit: default_retry_limit(),
    }
  }
}

fn default_timeout_secs() -> u64 {
  30
}

fn default_retry_limit() -> u32 {
  2
}

impl Config {
  /// Build a configuration programmatically, with defaults for everything
  /// but the base URL.
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      api: ApiConfig {
        base_url: base_url.into(),
        timeout_secs: default_timeout_secs(),
      },
      cache: CacheConfig::default(),
    }
  }

  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./paperfeed.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/paperfeed/config.yaml
  /// 4. ~/.config/paperfeed/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(ConfigError::NotFound(p.to_path_buf()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(ConfigError::NoConfigFile),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("paperfeed.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("paperfeed").join("config.yaml");
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

  /// Per-request timeout.
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.api.timeout_secs)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_full_config() {
    let yaml = r#"
api:
  base_url: https://api.example.com/v1
  timeout_secs: 10
cache:
  retry_limit: 1
"#;
    let config: Config = serde_yaml::from_str(yaml).expect("valid yaml");
    assert_eq!(config.api.base_url, "https://api.example.com/v1");
    assert_eq!(config.timeout(), Duration::from_secs(10));
    assert_eq!(config.cache.retry_limit, 1);
  }

  #[test]
  fn missing_sections_fall_back_to_defaults() {
    let yaml = r#"
api:
  base_url: https://api.example.com/v1
"#;
    let config: Config = serde_yaml::from_str(yaml).expect("valid yaml");
    assert_eq!(config.api.timeout_secs, 30);
    assert_eq!(config.cache.retry_limit, 2);
  }

  #[test]
  fn programmatic_config_uses_defaults() {
    let config = Config::new("https://api.example.com/v1");
    assert_eq!(config.cache.retry_limit, 2);
    assert_eq!(config.timeout(), Duration::from_secs(30));
  }
}
