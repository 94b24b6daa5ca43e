//! Wire-level request and response shapes for the feed API.
//!
//! Every list endpoint returns `{data: [...], pagination: {...}}`, every
//! singular endpoint `{data: {...}}`. These envelopes stay at the wire
//! boundary; domain code works with the unwrapped types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cache::Page;

/// `{data, pagination?}` response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
  pub data: T,
  #[serde(default)]
  pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Pagination {
  pub next_cursor: Option<String>,
  pub has_next: bool,
  #[serde(default)]
  pub total_count: Option<i64>,
}

impl<T> Envelope<Vec<T>> {
  /// Collapse a list envelope into a page. A missing pagination block
  /// reads as a single exhaustive page.
  pub fn into_page(self) -> Page<T> {
    let (next_cursor, has_next) = match self.pagination {
      Some(p) => (p.next_cursor, p.has_next),
      None => (None, false),
    };
    Page {
      items: self.data,
      next_cursor,
      has_next,
    }
  }
}

/// Filters for the papers list. The cursor is not part of the filter set:
/// it identifies a position inside the collection, not the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaperFilters {
  pub category_id: Option<i32>,
  /// 1 (low) to 5 (high)
  pub importance: Option<i32>,
  pub from_date: Option<NaiveDate>,
  pub to_date: Option<NaiveDate>,
}

impl PaperFilters {
  /// Canonical rendering in fixed field order, for cache-key hashing.
  pub fn canonical(&self) -> String {
    format!(
      "category_id={};importance={};from_date={};to_date={}",
      display_opt(&self.category_id),
      display_opt(&self.importance),
      display_opt(&self.from_date),
      display_opt(&self.to_date),
    )
  }

  /// Query pairs; undefined filters stay `None` and are omitted by the
  /// transport.
  pub fn params(&self) -> Vec<(&'static str, Option<String>)> {
    vec![
      ("category_id", self.category_id.map(|v| v.to_string())),
      ("importance", self.importance.map(|v| v.to_string())),
      ("from_date", self.from_date.map(|v| v.to_string())),
      ("to_date", self.to_date.map(|v| v.to_string())),
    ]
  }
}

fn display_opt<T: std::fmt::Display>(value: &Option<T>) -> String {
  value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

/// Cursor and page-size parameters shared by every list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
  /// Opaque server-issued cursor; `None` means the first page.
  pub cursor: Option<String>,
  pub limit: Option<u32>,
}

impl PageQuery {
  pub fn params(&self) -> Vec<(&'static str, Option<String>)> {
    vec![
      ("cursor", self.cursor.clone()),
      ("limit", self.limit.map(|v| v.to_string())),
    ]
  }
}

/// `POST /bookmarks` body.
#[derive(Debug, Clone, Serialize)]
pub struct CreateBookmarkRequest {
  pub arxiv_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
  Ja,
  En,
}

/// `PUT /users/me/settings` body; absent fields are left unchanged
/// server-side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateSettingsRequest {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub display_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub language: Option<Language>,
  /// 1 (beginner) to 3 (expert)
  #[serde(skip_serializing_if = "Option::is_none")]
  pub default_level: Option<i32>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::feed::types::PaperSummary;

  #[test]
  fn list_envelope_deserializes_and_collapses_to_a_page() {
    let json = r#"{
      "data": [{
        "arxiv_id": "2401.00001",
        "title": "Attention Is Not Enough",
        "category_id": 1,
        "category_name": "LLM",
        "importance": 4,
        "summary_ja": null,
        "one_line_takeaway": null,
        "authors": ["A. Author"],
        "published_at": "2024-01-01T00:00:00",
        "thumbnail_url": null,
        "is_bookmarked": false,
        "is_viewed": true
      }],
      "pagination": {"next_cursor": "abc", "has_next": true, "total_count": 41}
    }"#;

    let envelope: Envelope<Vec<PaperSummary>> = serde_json::from_str(json).expect("deserializes");
    assert_eq!(
      envelope.pagination.as_ref().and_then(|p| p.total_count),
      Some(41)
    );

    let page = envelope.into_page();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].arxiv_id, "2401.00001");
    assert_eq!(page.next_cursor.as_deref(), Some("abc"));
    assert!(page.has_next);
  }

  #[test]
  fn missing_pagination_reads_as_an_exhaustive_page() {
    let envelope: Envelope<Vec<i32>> =
      serde_json::from_str(r#"{"data": [1, 2]}"#).expect("deserializes");
    let page = envelope.into_page();
    assert_eq!(page.items, vec![1, 2]);
    assert!(!page.has_next);
    assert!(page.next_cursor.is_none());
  }

  #[test]
  fn filter_canonical_rendering_is_field_ordered() {
    let filters = PaperFilters {
      importance: Some(5),
      category_id: Some(2),
      ..Default::default()
    };
    assert_eq!(
      filters.canonical(),
      "category_id=2;importance=5;from_date=;to_date="
    );
  }

  #[test]
  fn undefined_filters_stay_undefined_in_params() {
    let filters = PaperFilters {
      category_id: Some(3),
      ..Default::default()
    };
    let params = filters.params();
    assert_eq!(params[0], ("category_id", Some("3".to_string())));
    assert_eq!(params[1], ("importance", None));
    assert_eq!(params[2], ("from_date", None));
    assert_eq!(params[3], ("to_date", None));
  }

  #[test]
  fn settings_request_skips_absent_fields() {
    let body = UpdateSettingsRequest {
      language: Some(Language::En),
      ..Default::default()
    };
    assert_eq!(
      serde_json::to_string(&body).expect("serializes"),
      r#"{"language":"en"}"#
    );
  }
}
