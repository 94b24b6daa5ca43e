//! Cached feed client that wraps [`FeedClient`] with the query cache.
//!
//! Queries come back as cache-backed handles sharing one cache instance,
//! so a bookmark toggled from any view is reflected everywhere a
//! dependent query is held. Mutations call straight through and, on
//! success only, apply the invalidation table.

use std::sync::Arc;

use crate::auth::CredentialProvider;
use crate::cache::{PagedQuery, Query, QueryCache};
use crate::config::Config;
use crate::error::{ApiError, ConfigError};
use crate::transport::NoContent;

use super::api_types::{PageQuery, PaperFilters, UpdateSettingsRequest};
use super::cache::{invalidation_targets, FeedQueryKey, MutationKind};
use super::client::FeedClient;
use super::types::{
  Bookmark, BookmarkReceipt, Category, Health, PaperDetail, PaperFigure, PaperSummary,
  UserProfile, UserStats, ViewReceipt,
};

/// Feed client with transparent caching support.
#[derive(Clone)]
pub struct CachedFeedClient {
  inner: FeedClient,
  cache: QueryCache,
}

impl CachedFeedClient {
  pub fn new(
    config: &Config,
    credentials: Arc<dyn CredentialProvider>,
  ) -> Result<Self, ConfigError> {
    let inner = FeedClient::new(config, credentials)?;
    let cache = QueryCache::with_retry_limit(config.cache.retry_limit);
    Ok(Self { inner, cache })
  }

  /// Wrap an existing raw client and cache (e.g. a cache shared with
  /// other clients of the same session).
  pub fn from_parts(inner: FeedClient, cache: QueryCache) -> Self {
    Self { inner, cache }
  }

  /// The underlying cache, for watching keys or wiring custom queries.
  pub fn cache(&self) -> &QueryCache {
    &self.cache
  }

  // --------------------------------------------------------------------
  // Queries
  // --------------------------------------------------------------------

  /// Infinite query over the filtered papers list.
  pub fn papers(&self, filters: PaperFilters) -> PagedQuery<PaperSummary> {
    let key = FeedQueryKey::Papers {
      filters: filters.clone(),
    };
    let inner = self.inner.clone();
    PagedQuery::new(self.cache.clone(), key, move |cursor| {
      let inner = inner.clone();
      let filters = filters.clone();
      async move {
        let page = PageQuery {
          cursor,
          limit: None,
        };
        inner.papers(&filters, &page).await
      }
    })
  }

  /// Infinite query over the user's bookmarks.
  pub fn bookmarks(&self) -> PagedQuery<Bookmark> {
    let inner = self.inner.clone();
    PagedQuery::new(self.cache.clone(), FeedQueryKey::Bookmarks, move |cursor| {
      let inner = inner.clone();
      async move {
        let page = PageQuery {
          cursor,
          limit: None,
        };
        inner.bookmarks(&page).await
      }
    })
  }

  pub fn paper_detail(&self, arxiv_id: &str) -> Query<PaperDetail> {
    let key = FeedQueryKey::Paper {
      arxiv_id: arxiv_id.to_string(),
    };
    let inner = self.inner.clone();
    let arxiv_id = arxiv_id.to_string();
    Query::new(self.cache.clone(), key, move || {
      let inner = inner.clone();
      let arxiv_id = arxiv_id.clone();
      async move { inner.paper(&arxiv_id).await }
    })
  }

  pub fn paper_figures(&self, arxiv_id: &str) -> Query<Vec<PaperFigure>> {
    let key = FeedQueryKey::PaperFigures {
      arxiv_id: arxiv_id.to_string(),
    };
    let inner = self.inner.clone();
    let arxiv_id = arxiv_id.to_string();
    Query::new(self.cache.clone(), key, move || {
      let inner = inner.clone();
      let arxiv_id = arxiv_id.clone();
      async move { inner.paper_figures(&arxiv_id).await }
    })
  }

  pub fn categories(&self) -> Query<Vec<Category>> {
    let inner = self.inner.clone();
    Query::new(self.cache.clone(), FeedQueryKey::Categories, move || {
      let inner = inner.clone();
      async move { inner.categories().await }
    })
  }

  pub fn user_profile(&self) -> Query<UserProfile> {
    let inner = self.inner.clone();
    Query::new(self.cache.clone(), FeedQueryKey::UserProfile, move || {
      let inner = inner.clone();
      async move { inner.user_profile().await }
    })
  }

  pub fn user_stats(&self) -> Query<UserStats> {
    let inner = self.inner.clone();
    Query::new(self.cache.clone(), FeedQueryKey::UserStats, move || {
      let inner = inner.clone();
      async move { inner.user_stats().await }
    })
  }

  /// Health probe (never cached).
  pub async fn health(&self) -> Result<Health, ApiError> {
    self.inner.health().await
  }

  // --------------------------------------------------------------------
  // Mutations
  // --------------------------------------------------------------------

  pub async fn add_bookmark(&self, arxiv_id: &str) -> Result<BookmarkReceipt, ApiError> {
    let receipt = self.inner.add_bookmark(arxiv_id).await?;
    self
      .cache
      .invalidate(&invalidation_targets(&MutationKind::AddBookmark {
        arxiv_id,
      }));
    Ok(receipt)
  }

  /// Remove a bookmark by its id. Pass the paper's arxiv id when the
  /// caller knows it (bookmark listings carry it) so the paper's detail
  /// entry is invalidated too; a detail view alone does not know the
  /// bookmark id, so removal is only reachable from listings.
  pub async fn remove_bookmark(
    &self,
    bookmark_id: i64,
    arxiv_id: Option<&str>,
  ) -> Result<NoContent, ApiError> {
    let result = self.inner.remove_bookmark(bookmark_id).await?;
    self
      .cache
      .invalidate(&invalidation_targets(&MutationKind::RemoveBookmark {
        arxiv_id,
      }));
    Ok(result)
  }

  pub async fn record_view(&self, arxiv_id: &str) -> Result<ViewReceipt, ApiError> {
    let receipt = self.inner.record_view(arxiv_id).await?;
    self
      .cache
      .invalidate(&invalidation_targets(&MutationKind::RecordView {
        arxiv_id,
      }));
    Ok(receipt)
  }

  pub async fn update_settings(
    &self,
    settings: &UpdateSettingsRequest,
  ) -> Result<UserProfile, ApiError> {
    let profile = self.inner.update_settings(settings).await?;
    self
      .cache
      .invalidate(&invalidation_targets(&MutationKind::UpdateSettings));
    Ok(profile)
  }

  /// Drop every cached entry (logout).
  pub fn logout(&self) {
    self.cache.clear();
  }
}
