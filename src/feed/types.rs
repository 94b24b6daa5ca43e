//! Domain types for the paper feed.
//!
//! Timestamps stay as ISO 8601 strings from the wire; nothing client-side
//! computes with them.

use serde::{Deserialize, Serialize};

/// Summary of a paper for list views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperSummary {
  pub arxiv_id: String,
  pub title: String,
  pub category_id: Option<i32>,
  pub category_name: Option<String>,
  /// 1 (low) to 5 (high)
  pub importance: Option<i32>,
  pub summary_ja: Option<String>,
  pub one_line_takeaway: Option<String>,
  pub authors: Vec<String>,
  pub published_at: String,
  pub thumbnail_url: Option<String>,
  pub is_bookmarked: bool,
  pub is_viewed: bool,
}

/// One summarized section of a paper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
  pub section_id: String,
  pub title_ja: String,
  pub content_ja: String,
}

/// Role-specific readings of a paper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perspectives {
  pub ai_engineer: String,
  pub mathematician: String,
  pub business: String,
}

/// Expertise-leveled readings of a paper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Levels {
  pub beginner: String,
  pub intermediate: String,
  pub expert: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureAnalysis {
  pub figure_ref: String,
  pub description_ja: String,
  pub is_key_figure: bool,
}

/// The generated deep-dive content of a paper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperDetailData {
  pub one_line_takeaway: String,
  pub sections: Vec<Section>,
  pub perspectives: Option<Perspectives>,
  pub levels: Option<Levels>,
  pub figure_analysis: Vec<FigureAnalysis>,
}

/// Full paper details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperDetail {
  pub arxiv_id: String,
  pub title: String,
  #[serde(rename = "abstract")]
  pub abstract_text: String,
  pub authors: Vec<String>,
  pub pdf_url: Option<String>,
  pub category_id: Option<i32>,
  pub category_name: Option<String>,
  pub importance: Option<i32>,
  pub published_at: String,
  pub summary_ja: Option<String>,
  pub detail: Option<PaperDetailData>,
  pub is_bookmarked: bool,
  pub is_viewed: bool,
}

/// An extracted figure image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperFigure {
  pub id: i64,
  pub figure_index: i32,
  pub s3_url: String,
  pub width: Option<i32>,
  pub height: Option<i32>,
  pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
  pub id: i32,
  pub name: String,
  pub paper_count: i64,
}

/// The paper fields a bookmark row carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkPaper {
  pub arxiv_id: String,
  pub title: String,
  pub category_id: Option<i32>,
  pub category_name: Option<String>,
  pub importance: Option<i32>,
  pub summary_ja: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
  pub bookmark_id: i64,
  pub bookmarked_at: String,
  pub paper: BookmarkPaper,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
  pub id: i64,
  pub email: String,
  pub display_name: Option<String>,
  pub auth_provider: String,
  pub language: String,
  pub default_level: i32,
  pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
  pub id: i32,
  pub name: String,
  pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
  pub papers_viewed: i64,
  pub bookmarks_count: i64,
  pub most_viewed_category: Option<CategoryCount>,
  pub member_since: String,
}

/// Receipt for a recorded paper view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewReceipt {
  pub viewed_at: String,
}

/// Receipt for a created bookmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkReceipt {
  pub bookmark_id: i64,
  pub bookmarked_at: String,
}

/// Health probe response. The only endpoint without the data envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
  pub status: String,
}
