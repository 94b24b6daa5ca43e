//! Raw typed client for the feed API.
//!
//! One method per endpoint-catalog row, no caching. The cached client
//! wraps this with the query cache and invalidation.

use std::sync::Arc;

use crate::auth::CredentialProvider;
use crate::cache::Page;
use crate::config::Config;
use crate::error::{ApiError, ConfigError};
use crate::transport::{NoContent, Transport};

use super::api_types::{
  CreateBookmarkRequest, Envelope, PageQuery, PaperFilters, UpdateSettingsRequest,
};
use super::endpoints;
use super::types::{
  Bookmark, BookmarkReceipt, Category, Health, PaperDetail, PaperFigure, PaperSummary,
  UserProfile, UserStats, ViewReceipt,
};

/// Feed API client
#[derive(Clone)]
pub struct FeedClient {
  transport: Transport,
}

impl FeedClient {
  pub fn new(
    config: &Config,
    credentials: Arc<dyn CredentialProvider>,
  ) -> Result<Self, ConfigError> {
    Ok(Self {
      transport: Transport::new(config, credentials)?,
    })
  }

  /// One page of the filtered papers list.
  pub async fn papers(
    &self,
    filters: &PaperFilters,
    page: &PageQuery,
  ) -> Result<Page<PaperSummary>, ApiError> {
    let mut params = filters.params();
    params.extend(page.params());

    let envelope: Envelope<Vec<PaperSummary>> =
      self.transport.get(endpoints::papers(), &params).await?;
    Ok(envelope.into_page())
  }

  /// Full detail for a single paper.
  pub async fn paper(&self, arxiv_id: &str) -> Result<PaperDetail, ApiError> {
    let envelope: Envelope<PaperDetail> =
      self.transport.get(endpoints::paper(arxiv_id), &[]).await?;
    Ok(envelope.data)
  }

  /// Record that the user opened a paper.
  pub async fn record_view(&self, arxiv_id: &str) -> Result<ViewReceipt, ApiError> {
    let envelope: Envelope<ViewReceipt> = self
      .transport
      .send(endpoints::record_view(arxiv_id), None::<&()>)
      .await?;
    Ok(envelope.data)
  }

  /// Extracted figures for a paper.
  pub async fn paper_figures(&self, arxiv_id: &str) -> Result<Vec<PaperFigure>, ApiError> {
    let envelope: Envelope<Vec<PaperFigure>> = self
      .transport
      .get(endpoints::paper_figures(arxiv_id), &[])
      .await?;
    Ok(envelope.data)
  }

  pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
    let envelope: Envelope<Vec<Category>> =
      self.transport.get(endpoints::categories(), &[]).await?;
    Ok(envelope.data)
  }

  /// One page of the user's bookmarks.
  pub async fn bookmarks(&self, page: &PageQuery) -> Result<Page<Bookmark>, ApiError> {
    let envelope: Envelope<Vec<Bookmark>> = self
      .transport
      .get(endpoints::bookmarks(), &page.params())
      .await?;
    Ok(envelope.into_page())
  }

  pub async fn add_bookmark(&self, arxiv_id: &str) -> Result<BookmarkReceipt, ApiError> {
    let body = CreateBookmarkRequest {
      arxiv_id: arxiv_id.to_string(),
    };
    let envelope: Envelope<BookmarkReceipt> = self
      .transport
      .send(endpoints::add_bookmark(), Some(&body))
      .await?;
    Ok(envelope.data)
  }

  /// Delete a bookmark. Success is a 204; [`NoContent`] is the defined
  /// result.
  pub async fn remove_bookmark(&self, bookmark_id: i64) -> Result<NoContent, ApiError> {
    self
      .transport
      .delete(endpoints::remove_bookmark(bookmark_id))
      .await
  }

  pub async fn user_profile(&self) -> Result<UserProfile, ApiError> {
    let envelope: Envelope<UserProfile> =
      self.transport.get(endpoints::user_profile(), &[]).await?;
    Ok(envelope.data)
  }

  /// Update profile settings, returning the updated profile.
  pub async fn update_settings(
    &self,
    settings: &UpdateSettingsRequest,
  ) -> Result<UserProfile, ApiError> {
    let envelope: Envelope<UserProfile> = self
      .transport
      .send(endpoints::update_settings(), Some(settings))
      .await?;
    Ok(envelope.data)
  }

  pub async fn user_stats(&self) -> Result<UserStats, ApiError> {
    let envelope: Envelope<UserStats> =
      self.transport.get(endpoints::user_stats(), &[]).await?;
    Ok(envelope.data)
  }

  /// Health probe; the only unauthenticated endpoint, and the only one
  /// without the data envelope.
  pub async fn health(&self) -> Result<Health, ApiError> {
    self.transport.get(endpoints::health(), &[]).await
  }
}
