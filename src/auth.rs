//! Credential provider seam.
//!
//! The identity provider (token issuance, refresh, storage) is an external
//! collaborator; the client only ever asks "what is the current bearer
//! token, if any". A provider failure is indistinguishable from "no
//! session" — it never fails a request on its own. Endpoints flagged as
//! auth-required in the endpoint catalog short-circuit separately when no
//! token exists.

use async_trait::async_trait;

/// Supplies the bearer token for the current session.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
  /// The current token, or `None` when no session exists.
  async fn token(&self) -> Option<String>;
}

/// A fixed token. Useful for tests and short-lived tools.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl CredentialProvider for StaticToken {
  async fn token(&self) -> Option<String> {
    Some(self.0.clone())
  }
}

/// No session. Auth-required endpoints resolve `UNAUTHENTICATED` without
/// reaching the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

#[async_trait]
impl CredentialProvider for Anonymous {
  async fn token(&self) -> Option<String> {
    None
  }
}

/// Reads the token from an environment variable on every request, so an
/// externally refreshed token is picked up without restarting.
///
/// Checks `PAPERFEED_TOKEN` by default.
#[derive(Debug, Clone)]
pub struct EnvToken {
  var: String,
}

impl EnvToken {
  pub fn new() -> Self {
    Self::from_var("PAPERFEED_TOKEN")
  }

  pub fn from_var(var: impl Into<String>) -> Self {
    Self { var: var.into() }
  }
}

impl Default for EnvToken {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl CredentialProvider for EnvToken {
  async fn token(&self) -> Option<String> {
    std::env::var(&self.var).ok().filter(|t| !t.is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn static_token_yields_token() {
    let provider = StaticToken("abc".to_string());
    assert_eq!(provider.token().await.as_deref(), Some("abc"));
  }

  #[tokio::test]
  async fn anonymous_yields_none() {
    assert_eq!(Anonymous.token().await, None);
  }

  #[tokio::test]
  async fn env_token_ignores_empty_values() {
    std::env::set_var("PAPERFEED_TEST_TOKEN_EMPTY", "");
    let provider = EnvToken::from_var("PAPERFEED_TEST_TOKEN_EMPTY");
    assert_eq!(provider.token().await, None);

    std::env::set_var("PAPERFEED_TEST_TOKEN_SET", "tok-1");
    let provider = EnvToken::from_var("PAPERFEED_TEST_TOKEN_SET");
    assert_eq!(provider.token().await.as_deref(), Some("tok-1"));
  }
}
