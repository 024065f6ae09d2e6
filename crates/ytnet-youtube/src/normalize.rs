//! Normalization of raw API items into `ytnet-core` domain types.
//!
//! Each function takes one JSON item from a page's `items` array. Failures
//! are reported per item as [`ItemError`] so callers can skip and count them.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use ytnet_core::{Comment, User, Video};

use crate::error::ItemError;
use crate::types::{CommentThread, SearchResult, VideoResource};

fn decode<T: DeserializeOwned>(item: &Value, kind: &'static str) -> Result<T, ItemError> {
    T::deserialize(item).map_err(|source| ItemError::Shape { kind, source })
}

/// Parses an RFC 3339 timestamp such as `"2024-03-01T12:00:00Z"`.
///
/// Returns `None` if the string is not a valid timestamp.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_count(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
}

/// Extracts the video ID from a `search.list` result.
///
/// # Errors
///
/// Returns [`ItemError`] for non-video results or malformed items.
pub fn search_result_video_id(item: &Value) -> Result<String, ItemError> {
    let result: SearchResult = decode(item, "search")?;
    result
        .id
        .video_id
        .filter(|id| !id.is_empty())
        .ok_or(ItemError::Missing {
            kind: "search",
            field: "id.videoId",
        })
}

/// Converts a `videos.list` item into a [`Video`].
///
/// # Errors
///
/// Returns [`ItemError::Shape`] when the item lacks an `id` or has mistyped fields.
pub fn normalize_video(item: &Value) -> Result<Video, ItemError> {
    let resource: VideoResource = decode(item, "video")?;
    if resource.id.is_empty() {
        return Err(ItemError::Missing {
            kind: "video",
            field: "id",
        });
    }
    let snippet = resource.snippet;
    let stats = resource.statistics;

    Ok(Video {
        title: snippet
            .as_ref()
            .and_then(|s| s.title.clone())
            .unwrap_or_default(),
        description: snippet
            .as_ref()
            .and_then(|s| s.description.clone())
            .unwrap_or_default(),
        channel_id: snippet.as_ref().and_then(|s| s.channel_id.clone()),
        channel_title: snippet.as_ref().and_then(|s| s.channel_title.clone()),
        published_at: snippet
            .as_ref()
            .and_then(|s| s.published_at.as_deref())
            .and_then(parse_timestamp),
        view_count: parse_count(stats.as_ref().and_then(|s| s.view_count.as_deref())),
        like_count: parse_count(stats.as_ref().and_then(|s| s.like_count.as_deref())),
        comment_count: parse_count(stats.as_ref().and_then(|s| s.comment_count.as_deref())),
        duration: resource.content_details.and_then(|d| d.duration),
        id: resource.id,
    })
}

/// Converts a `commentThreads.list` item into its author and top-level comment.
///
/// `video_id` is the video the thread was requested for; it is used when the
/// snippet omits `videoId`.
///
/// # Errors
///
/// Returns [`ItemError::Missing`] when the author has no channel ID (the
/// author cannot become a graph node) and [`ItemError::Shape`] for
/// malformed items.
pub fn normalize_comment_thread(item: &Value, video_id: &str) -> Result<(User, Comment), ItemError> {
    let thread: CommentThread = decode(item, "commentThread")?;
    let target = thread
        .snippet
        .video_id
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| video_id.to_owned());
    let top = thread.snippet.top_level_comment;
    let sn = top.snippet;

    let author_id = sn
        .author_channel_id
        .map(|a| a.value)
        .filter(|v| !v.is_empty())
        .ok_or(ItemError::Missing {
            kind: "commentThread",
            field: "snippet.topLevelComment.snippet.authorChannelId.value",
        })?;

    let user = User {
        id: author_id.clone(),
        display_name: sn.author_display_name.unwrap_or_default(),
    };
    let comment = Comment {
        id: top.id,
        author_id,
        video_id: target,
        text: sn.text_display.or(sn.text_original).unwrap_or_default(),
        like_count: sn.like_count.unwrap_or(0),
        published_at: sn.published_at.as_deref().and_then(parse_timestamp),
        is_top_level: true,
    };
    Ok((user, comment))
}
