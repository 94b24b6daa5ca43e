//! Cache identities and the mutation→invalidation table for feed
//! resources.

use std::time::Duration;

use crate::cache::{KeyMatcher, QueryKey, DEFAULT_FRESHNESS};

use super::api_types::PaperFilters;

/// Resource names. One resource per key family; invalidation wildcards
/// match on these.
pub mod resources {
  pub const PAPERS: &str = "papers";
  pub const PAPER: &str = "paper";
  pub const PAPER_FIGURES: &str = "paper_figures";
  pub const CATEGORIES: &str = "categories";
  pub const BOOKMARKS: &str = "bookmarks";
  pub const USER_PROFILE: &str = "user_profile";
  pub const USER_STATS: &str = "user_stats";
}

/// Categories move when the ingestion pipeline runs, not per interaction.
const CATEGORIES_FRESHNESS: Duration = Duration::from_secs(3600);

// ============================================================================
// Query key types
// ============================================================================

/// Cache keys for feed API queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedQueryKey {
  /// The filtered papers list
  Papers { filters: PaperFilters },
  /// A single paper's detail
  Paper { arxiv_id: String },
  /// Extracted figures for a paper
  PaperFigures { arxiv_id: String },
  Categories,
  Bookmarks,
  UserProfile,
  UserStats,
}

impl QueryKey for FeedQueryKey {
  fn resource(&self) -> &str {
    match self {
      Self::Papers { .. } => resources::PAPERS,
      Self::Paper { .. } => resources::PAPER,
      Self::PaperFigures { .. } => resources::PAPER_FIGURES,
      Self::Categories => resources::CATEGORIES,
      Self::Bookmarks => resources::BOOKMARKS,
      Self::UserProfile => resources::USER_PROFILE,
      Self::UserStats => resources::USER_STATS,
    }
  }

  fn canonical(&self) -> String {
    match self {
      Self::Papers { filters } => format!("papers:{}", filters.canonical()),
      Self::Paper { arxiv_id } => format!("paper:{}", arxiv_id),
      Self::PaperFigures { arxiv_id } => format!("paper_figures:{}", arxiv_id),
      Self::Categories => "categories".to_string(),
      Self::Bookmarks => "bookmarks".to_string(),
      Self::UserProfile => "user_profile".to_string(),
      Self::UserStats => "user_stats".to_string(),
    }
  }

  fn description(&self) -> String {
    match self {
      Self::Papers { filters } => format!("papers ({})", filters.canonical()),
      Self::Paper { arxiv_id } => format!("paper {}", arxiv_id),
      Self::PaperFigures { arxiv_id } => format!("figures for {}", arxiv_id),
      Self::Categories => "categories".to_string(),
      Self::Bookmarks => "bookmarks".to_string(),
      Self::UserProfile => "user profile".to_string(),
      Self::UserStats => "user stats".to_string(),
    }
  }

  fn freshness(&self) -> Duration {
    match self {
      Self::Categories => CATEGORIES_FRESHNESS,
      _ => DEFAULT_FRESHNESS,
    }
  }
}

// ============================================================================
// Mutation → invalidation table
// ============================================================================

/// The write operations the feed supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind<'a> {
  AddBookmark {
    arxiv_id: &'a str,
  },
  /// Removal is keyed by bookmark id; the paper id is only known when the
  /// caller came from a listing that carried it.
  RemoveBookmark {
    arxiv_id: Option<&'a str>,
  },
  RecordView {
    arxiv_id: &'a str,
  },
  UpdateSettings,
}

/// Static lookup: which cache entries a successful mutation must mark
/// stale. All `papers` list variants are hit wholesale — the boolean
/// flags they project can change under any filter combination.
pub fn invalidation_targets(mutation: &MutationKind<'_>) -> Vec<KeyMatcher> {
  match mutation {
    MutationKind::AddBookmark { arxiv_id } => vec![
      KeyMatcher::Resource(resources::BOOKMARKS),
      KeyMatcher::Resource(resources::PAPERS),
      KeyMatcher::exact(&FeedQueryKey::Paper {
        arxiv_id: (*arxiv_id).to_string(),
      }),
    ],
    MutationKind::RemoveBookmark { arxiv_id } => {
      let mut targets = vec![
        KeyMatcher::Resource(resources::BOOKMARKS),
        KeyMatcher::Resource(resources::PAPERS),
      ];
      if let Some(arxiv_id) = arxiv_id {
        targets.push(KeyMatcher::exact(&FeedQueryKey::Paper {
          arxiv_id: (*arxiv_id).to_string(),
        }));
      }
      targets
    }
    MutationKind::RecordView { arxiv_id } => vec![
      KeyMatcher::Resource(resources::PAPERS),
      KeyMatcher::exact(&FeedQueryKey::Paper {
        arxiv_id: (*arxiv_id).to_string(),
      }),
    ],
    MutationKind::UpdateSettings => vec![KeyMatcher::Resource(resources::USER_PROFILE)],
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn identical_filters_produce_identical_keys() {
    let a = FeedQueryKey::Papers {
      filters: PaperFilters {
        category_id: Some(1),
        importance: Some(4),
        ..Default::default()
      },
    };
    let b = FeedQueryKey::Papers {
      filters: PaperFilters {
        category_id: Some(1),
        importance: Some(4),
        ..Default::default()
      },
    };
    assert_eq!(a.cache_hash(), b.cache_hash());
  }

  #[test]
  fn different_filters_produce_distinct_keys() {
    let a = FeedQueryKey::Papers {
      filters: PaperFilters {
        category_id: Some(1),
        ..Default::default()
      },
    };
    let b = FeedQueryKey::Papers {
      filters: PaperFilters {
        category_id: Some(2),
        ..Default::default()
      },
    };
    assert_ne!(a.cache_hash(), b.cache_hash());
  }

  #[test]
  fn resources_never_collide() {
    assert_ne!(
      FeedQueryKey::Bookmarks.cache_hash(),
      FeedQueryKey::Categories.cache_hash()
    );
    assert_ne!(
      FeedQueryKey::Paper {
        arxiv_id: "x".into()
      }
      .cache_hash(),
      FeedQueryKey::PaperFigures {
        arxiv_id: "x".into()
      }
      .cache_hash()
    );
  }

  #[test]
  fn categories_get_the_long_freshness_window() {
    assert_eq!(
      FeedQueryKey::Categories.freshness(),
      Duration::from_secs(3600)
    );
    assert_eq!(
      FeedQueryKey::Bookmarks.freshness(),
      Duration::from_secs(60)
    );
  }

  #[test]
  fn add_bookmark_invalidates_lists_and_the_paper() {
    let targets = invalidation_targets(&MutationKind::AddBookmark {
      arxiv_id: "2401.00001",
    });
    assert!(targets.contains(&KeyMatcher::Resource(resources::BOOKMARKS)));
    assert!(targets.contains(&KeyMatcher::Resource(resources::PAPERS)));

    let paper_key = FeedQueryKey::Paper {
      arxiv_id: "2401.00001".to_string(),
    };
    assert!(targets
      .iter()
      .any(|m| m.matches(&paper_key.cache_hash(), resources::PAPER)));
  }

  #[test]
  fn remove_bookmark_without_paper_id_skips_the_detail_entry() {
    let targets = invalidation_targets(&MutationKind::RemoveBookmark { arxiv_id: None });
    assert_eq!(
      targets,
      vec![
        KeyMatcher::Resource(resources::BOOKMARKS),
        KeyMatcher::Resource(resources::PAPERS),
      ]
    );
  }

  #[test]
  fn update_settings_touches_only_the_profile() {
    let targets = invalidation_targets(&MutationKind::UpdateSettings);
    assert_eq!(targets, vec![KeyMatcher::Resource(resources::USER_PROFILE)]);
  }
}
