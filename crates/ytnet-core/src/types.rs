//! Graph entities produced by a collection run.
//!
//! All entities are write-once: the first observation of an ID within a run
//! is kept and later observations are ignored by the builders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata snapshot of a video, as returned by `videos.list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    /// `None` when the statistic is hidden by the uploader.
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    /// ISO-8601 duration string, e.g. `"PT4M13S"`.
    pub duration: Option<String>,
}

impl Video {
    /// A placeholder for a video referenced by a comment before its
    /// metadata was fetched.
    #[must_use]
    pub fn stub(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            title: String::new(),
            description: String::new(),
            channel_id: None,
            channel_title: None,
            published_at: None,
            view_count: None,
            like_count: None,
            comment_count: None,
            duration: None,
        }
    }

    /// Title and description joined by a single space: the document used
    /// for text similarity.
    #[must_use]
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

/// A comment author, keyed by their channel ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: String,
}

/// A top-level comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author_id: String,
    pub video_id: String,
    pub text: String,
    pub like_count: u64,
    pub published_at: Option<DateTime<Utc>>,
    /// Always `true` for collected comments; replies are not collected.
    pub is_top_level: bool,
}

/// Aggregated "commented-on" edge between a user and a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentEdge {
    pub user_id: String,
    pub video_id: String,
    /// Number of comments; always equals `comment_ids.len()`.
    pub weight: u32,
    /// Contributing comment IDs in ingestion order.
    pub comment_ids: Vec<String>,
}

/// Undirected text-similarity edge. `video_a < video_b` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityEdge {
    pub video_a: String,
    pub video_b: String,
    /// Cosine similarity in `[0, 1]`.
    pub weight: f64,
}
