//! The paper feed domain: typed API operations, cache keys, and the
//! mutation→invalidation table.

mod api_types;
mod cache;
mod cached_client;
mod client;
pub mod endpoints;
mod types;

pub use api_types::{
  CreateBookmarkRequest, Envelope, Language, PageQuery, Pagination, PaperFilters,
  UpdateSettingsRequest,
};
pub use cache::{invalidation_targets, resources, FeedQueryKey, MutationKind};
pub use cached_client::CachedFeedClient;
pub use client::FeedClient;
pub use types::{
  Bookmark, BookmarkPaper, BookmarkReceipt, Category, CategoryCount, FigureAnalysis, Health,
  Levels, PaperDetail, PaperDetailData, PaperFigure, PaperSummary, Perspectives, Section,
  UserProfile, UserStats, ViewReceipt,
};
