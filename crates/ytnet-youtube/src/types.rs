//! `YouTube` Data API v3 response types.
//!
//! Pages are kept as raw [`serde_json::Value`] until they are archived; the
//! typed structs below are applied per item so that one malformed item does
//! not discard the whole page. Every list response shares the
//! `{ "items": [...], "nextPageToken": "..." }` envelope.

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Error envelope
// ---------------------------------------------------------------------------

/// Body of a non-2xx response: `{ "error": { "code", "message", "errors" } }`.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// search.list
// ---------------------------------------------------------------------------

/// One `search.list` result (`part=id`).
#[derive(Debug, Deserialize)]
pub struct SearchResult {
    pub id: SearchResultId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultId {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub video_id: Option<String>,
}

// ---------------------------------------------------------------------------
// videos.list
// ---------------------------------------------------------------------------

/// One `videos.list` item (`part=snippet,statistics,contentDetails`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResource {
    pub id: String,
    #[serde(default)]
    pub snippet: Option<VideoSnippet>,
    #[serde(default)]
    pub statistics: Option<VideoStatistics>,
    #[serde(default)]
    pub content_details: Option<VideoContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub channel_title: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
}

/// Counters arrive as decimal strings (`"viewCount": "1234"`); absent
/// fields mean the uploader hid them.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    #[serde(default)]
    pub view_count: Option<String>,
    #[serde(default)]
    pub like_count: Option<String>,
    #[serde(default)]
    pub comment_count: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VideoContentDetails {
    #[serde(default)]
    pub duration: Option<String>,
}

// ---------------------------------------------------------------------------
// commentThreads.list
// ---------------------------------------------------------------------------

/// One `commentThreads.list` item (`part=snippet`).
#[derive(Debug, Deserialize)]
pub struct CommentThread {
    #[serde(default)]
    pub id: Option<String>,
    pub snippet: CommentThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadSnippet {
    #[serde(default)]
    pub video_id: Option<String>,
    pub top_level_comment: TopLevelComment,
    #[serde(default)]
    pub total_reply_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct TopLevelComment {
    pub id: String,
    pub snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSnippet {
    #[serde(default)]
    pub author_display_name: Option<String>,
    #[serde(default)]
    pub author_channel_id: Option<AuthorChannelId>,
    #[serde(default)]
    pub text_display: Option<String>,
    #[serde(default)]
    pub text_original: Option<String>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthorChannelId {
    pub value: String,
}
