//! Endpoint catalog: one row per remote operation.
//!
//! Paths arrive at the transport fully substituted. Every resource except
//! the health probe requires a credential; the transport short-circuits
//! auth-required calls with `UNAUTHENTICATED` when no token exists.

use reqwest::Method;

use crate::transport::{Auth, Endpoint};

pub fn papers() -> Endpoint {
  Endpoint::new(Method::GET, "/papers", Auth::Required)
}

pub fn paper(arxiv_id: &str) -> Endpoint {
  Endpoint::new(Method::GET, format!("/papers/{}", arxiv_id), Auth::Required)
}

pub fn record_view(arxiv_id: &str) -> Endpoint {
  Endpoint::new(
    Method::POST,
    format!("/papers/{}/view", arxiv_id),
    Auth::Required,
  )
}

pub fn paper_figures(arxiv_id: &str) -> Endpoint {
  Endpoint::new(
    Method::GET,
    format!("/papers/{}/figures", arxiv_id),
    Auth::Required,
  )
}

pub fn categories() -> Endpoint {
  Endpoint::new(Method::GET, "/categories", Auth::Required)
}

pub fn bookmarks() -> Endpoint {
  Endpoint::new(Method::GET, "/bookmarks", Auth::Required)
}

pub fn add_bookmark() -> Endpoint {
  Endpoint::new(Method::POST, "/bookmarks", Auth::Required)
}

pub fn remove_bookmark(bookmark_id: i64) -> Endpoint {
  Endpoint::new(
    Method::DELETE,
    format!("/bookmarks/{}", bookmark_id),
    Auth::Required,
  )
}

pub fn user_profile() -> Endpoint {
  Endpoint::new(Method::GET, "/users/me", Auth::Required)
}

pub fn update_settings() -> Endpoint {
  Endpoint::new(Method::PUT, "/users/me/settings", Auth::Required)
}

pub fn user_stats() -> Endpoint {
  Endpoint::new(Method::GET, "/users/me/stats", Auth::Required)
}

pub fn health() -> Endpoint {
  Endpoint::new(Method::GET, "/health", Auth::None)
}
