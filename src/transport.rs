//! HTTP transport: a single request/response exchange against the remote
//! API.
//!
//! The transport attaches the bearer credential when one exists, serializes
//! only defined-valued query parameters, maps status 204 to a distinct
//! [`NoContent`] value, and classifies every failure into [`ApiError`] —
//! no raw network error crosses this boundary.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

use crate::auth::CredentialProvider;
use crate::config::Config;
use crate::error::{codes, ApiError, ConfigError};

/// Whether an endpoint can be called without a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
  /// A missing token short-circuits with `UNAUTHENTICATED` before any
  /// network I/O.
  Required,
  /// The request proceeds without an `Authorization` header when no
  /// session exists.
  None,
}

/// One row of the endpoint catalog: a fully substituted path, the HTTP
/// method, and the auth requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
  pub method: Method,
  pub path: String,
  pub auth: Auth,
}

impl Endpoint {
  pub fn new(method: Method, path: impl Into<String>, auth: Auth) -> Self {
    Self {
      method,
      path: path.into(),
      auth,
    }
  }
}

/// Marker for a 204 response. Distinct from an empty JSON object: callers
/// can never conflate "the server said nothing" with "the server said {}".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoContent;

/// A successful exchange: either a JSON body or no content at all.
#[derive(Debug, Clone, PartialEq)]
enum Payload {
  Json(serde_json::Value),
  Empty,
}

/// Optional-valued query pairs; `None` entries are omitted entirely
/// rather than sent as empty strings.
pub type QueryPairs<'a> = [(&'a str, Option<String>)];

#[derive(Clone)]
pub struct Transport {
  http: reqwest::Client,
  base_url: String,
  credentials: Arc<dyn CredentialProvider>,
}

impl Transport {
  pub fn new(
    config: &Config,
    credentials: Arc<dyn CredentialProvider>,
  ) -> Result<Self, ConfigError> {
    // Validate early; the request path only ever concatenates.
    Url::parse(&config.api.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
      url: config.api.base_url.clone(),
      source: e,
    })?;

    let http = reqwest::Client::builder()
      .timeout(config.timeout())
      .build()
      .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

    Ok(Self {
      http,
      base_url: config.api.base_url.trim_end_matches('/').to_string(),
      credentials,
    })
  }

  /// GET returning a JSON body.
  pub async fn get<T: DeserializeOwned>(
    &self,
    endpoint: Endpoint,
    query: &QueryPairs<'_>,
  ) -> Result<T, ApiError> {
    match self.dispatch(&endpoint, query, None::<&()>).await? {
      Payload::Json(value) => decode(value),
      Payload::Empty => Err(ApiError::unknown(format!(
        "Expected a response body from {} {}",
        endpoint.method, endpoint.path
      ))),
    }
  }

  /// POST/PUT with an optional JSON body, returning a JSON body.
  pub async fn send<T, B>(&self, endpoint: Endpoint, body: Option<&B>) -> Result<T, ApiError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    match self.dispatch(&endpoint, &[], body).await? {
      Payload::Json(value) => decode(value),
      Payload::Empty => Err(ApiError::unknown(format!(
        "Expected a response body from {} {}",
        endpoint.method, endpoint.path
      ))),
    }
  }

  /// Request where success carries no body (DELETE).
  pub async fn delete(&self, endpoint: Endpoint) -> Result<NoContent, ApiError> {
    match self.dispatch(&endpoint, &[], None::<&()>).await? {
      Payload::Empty => Ok(NoContent),
      // A 2xx with a body still means the operation succeeded.
      Payload::Json(_) => Ok(NoContent),
    }
  }

  async fn dispatch<B>(
    &self,
    endpoint: &Endpoint,
    query: &QueryPairs<'_>,
    body: Option<&B>,
  ) -> Result<Payload, ApiError>
  where
    B: Serialize + ?Sized,
  {
    // Provider failures read as "no session", never as a request failure.
    let token = self.credentials.token().await;
    if endpoint.auth == Auth::Required && token.is_none() {
      return Err(ApiError::unauthenticated());
    }

    let url = format!("{}{}", self.base_url, endpoint.path);
    let mut request = self.http.request(endpoint.method.clone(), &url);

    let defined = defined_pairs(query);
    if !defined.is_empty() {
      request = request.query(&defined);
    }
    if let Some(token) = token {
      request = request.bearer_auth(token);
    }
    if let Some(body) = body {
      request = request.json(body);
    }

    let response = request
      .send()
      .await
      .map_err(|e| ApiError::network(e.to_string()))?;

    let status = response.status().as_u16();
    let text = response
      .text()
      .await
      .map_err(|e| ApiError::network(e.to_string()))?;

    let payload = into_payload(status, &text);
    if let Err(err) = &payload {
      tracing::debug!(status, code = %err.code, path = %endpoint.path, "request failed");
    }
    payload
  }
}

/// Classify a completed exchange. 204 is its own payload, never parsed
/// and never mistakable for an empty JSON object.
fn into_payload(status: u16, body: &str) -> Result<Payload, ApiError> {
  if status == 204 {
    return Ok(Payload::Empty);
  }
  if (200..300).contains(&status) {
    serde_json::from_str(body)
      .map(Payload::Json)
      .map_err(ApiError::decode)
  } else {
    Err(classify_error(status, body))
  }
}

/// Drop undefined-valued query pairs.
fn defined_pairs<'a>(query: &'a QueryPairs<'a>) -> Vec<(&'a str, &'a str)> {
  query
    .iter()
    .filter_map(|(key, value)| value.as_deref().map(|v| (*key, v)))
    .collect()
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
  error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
  code: Option<String>,
  message: Option<String>,
}

/// Classify a non-2xx response. Server codes pass through verbatim; a
/// malformed or code-less body falls back to `UNKNOWN_ERROR`.
fn classify_error(status: u16, body: &str) -> ApiError {
  let parsed: Option<ErrorBody> = serde_json::from_str::<ErrorEnvelope>(body)
    .ok()
    .and_then(|envelope| envelope.error);

  let (code, message) = match parsed {
    Some(error) => (
      error.code.unwrap_or_else(|| codes::UNKNOWN_ERROR.to_string()),
      error
        .message
        .unwrap_or_else(|| "An unknown error occurred".to_string()),
    ),
    None => (
      codes::UNKNOWN_ERROR.to_string(),
      "An unknown error occurred".to_string(),
    ),
  };

  ApiError::new(status, code, message)
}

fn decode<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, ApiError> {
  serde_json::from_value(value).map_err(ApiError::decode)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::auth::Anonymous;

  fn unreachable_transport() -> Transport {
    // Nothing listens on port 9; only the no-auth path may ever dial it.
    let config = Config::new("http://127.0.0.1:9/v1");
    Transport::new(&config, Arc::new(Anonymous)).expect("transport")
  }

  #[test]
  fn server_error_codes_pass_through() {
    let err = classify_error(409, r#"{"error":{"code":"ALREADY_BOOKMARKED","message":"dup"}}"#);
    assert_eq!(err.status, 409);
    assert_eq!(err.code, "ALREADY_BOOKMARKED");
    assert_eq!(err.message, "dup");
  }

  #[test]
  fn codeless_error_body_maps_to_unknown() {
    let err = classify_error(500, r#"{"error":{"message":"boom"}}"#);
    assert_eq!(err.code, codes::UNKNOWN_ERROR);
    assert_eq!(err.message, "boom");
  }

  #[test]
  fn malformed_error_body_maps_to_unknown() {
    let err = classify_error(502, "<html>Bad Gateway</html>");
    assert_eq!(err.status, 502);
    assert_eq!(err.code, codes::UNKNOWN_ERROR);
    assert_eq!(err.message, "An unknown error occurred");
  }

  #[test]
  fn status_204_is_no_content_not_an_empty_object() {
    assert_eq!(into_payload(204, "").expect("no content"), Payload::Empty);
    assert_eq!(
      into_payload(200, "{}").expect("json"),
      Payload::Json(serde_json::json!({}))
    );
    assert_ne!(
      into_payload(204, "").expect("no content"),
      into_payload(200, "{}").expect("json")
    );
  }

  #[test]
  fn undefined_query_values_are_omitted() {
    let pairs = [
      ("category_id", Some("3".to_string())),
      ("importance", None),
      ("cursor", Some("abc".to_string())),
    ];
    assert_eq!(defined_pairs(&pairs), vec![("category_id", "3"), ("cursor", "abc")]);
  }

  #[tokio::test]
  async fn missing_credential_short_circuits_before_network() {
    let transport = unreachable_transport();
    let endpoint = Endpoint::new(Method::GET, "/papers", Auth::Required);

    let err = transport
      .get::<serde_json::Value>(endpoint, &[])
      .await
      .expect_err("must not succeed");
    assert_eq!(err.code, codes::UNAUTHENTICATED);
    assert_eq!(err.status, 0);
  }

  #[tokio::test]
  async fn transport_failures_classify_as_network_error() {
    let transport = unreachable_transport();
    let endpoint = Endpoint::new(Method::GET, "/health", Auth::None);

    let err = transport
      .get::<serde_json::Value>(endpoint, &[])
      .await
      .expect_err("nothing listens there");
    assert_eq!(err.code, codes::NETWORK_ERROR);
    assert_eq!(err.status, 0);
  }
}
