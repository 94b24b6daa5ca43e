//! Typed errors for the client.
//!
//! `ApiError` is the only error type that crosses the transport boundary:
//! network failures, missing credentials, and server-reported errors all
//! resolve to it. `ConfigError` covers setup-time failures and never
//! reaches the request path.

use std::path::PathBuf;
use thiserror::Error;

/// Error codes produced client-side. Server-reported codes pass through
/// verbatim and are not enumerated here.
pub mod codes {
  /// Transport-level failure, no response was received.
  pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
  /// Missing credential on an auth-required endpoint.
  pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
  /// Malformed or code-less error body, or an undecodable response.
  pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";
}

/// A classified failure from the remote API.
///
/// `status` is the HTTP status code, or 0 when the failure happened before
/// a response existed (network failure, missing credential, decode).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code} (status {status}): {message}")]
pub struct ApiError {
  pub status: u16,
  pub code: String,
  pub message: String,
}

impl ApiError {
  pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      status,
      code: code.into(),
      message: message.into(),
    }
  }

  /// Transport failure with no response.
  pub fn network(message: impl Into<String>) -> Self {
    Self::new(0, codes::NETWORK_ERROR, message)
  }

  /// Missing credential on an auth-required endpoint.
  pub fn unauthenticated() -> Self {
    Self::new(
      0,
      codes::UNAUTHENTICATED,
      "No credential available for an authenticated endpoint",
    )
  }

  pub fn unknown(message: impl Into<String>) -> Self {
    Self::new(0, codes::UNKNOWN_ERROR, message)
  }

  pub(crate) fn decode(err: serde_json::Error) -> Self {
    Self::unknown(format!("Failed to decode response body: {}", err))
  }

  /// Whether an automatic retry can change the outcome. A missing
  /// credential resolves client-side, so re-issuing is pointless.
  pub fn is_retryable(&self) -> bool {
    self.code != codes::UNAUTHENTICATED
  }
}

/// Setup-time failures: configuration discovery, parsing, client build.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Config file not found: {0}")]
  NotFound(PathBuf),

  #[error(
    "No configuration file found. Create one at ~/.config/paperfeed/config.yaml\n\
     See config.example.yaml for the format."
  )]
  NoConfigFile,

  #[error("Failed to read config file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to parse config file {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("Invalid base URL '{url}': {source}")]
  InvalidBaseUrl {
    url: String,
    #[source]
    source: url::ParseError,
  },

  #[error("Failed to build HTTP client: {0}")]
  HttpClient(String),
}
