//! CSV rendering and parsing. Rows are sorted by ID so equal inputs render to
//! identical bytes.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use csv::{Reader, Writer};
use serde::{Deserialize, Serialize};
use ytnet_core::{Comment, CommentEdge, SimilarityEdge, User, Video};

use crate::error::ExportError;

/// Column layout of `nodes_videos.csv`. Field order is column order.
#[derive(Debug, Serialize, Deserialize)]
struct VideoRow {
    video_id: String,
    title: String,
    description: String,
    channel_id: Option<String>,
    channel_title: Option<String>,
    published_at: Option<String>,
    view_count: Option<u64>,
    like_count: Option<u64>,
    comment_count: Option<u64>,
    duration: Option<String>,
}

impl From<&Video> for VideoRow {
    fn from(v: &Video) -> Self {
        Self {
            video_id: v.id.clone(),
            title: v.title.clone(),
            description: v.description.clone(),
            channel_id: v.channel_id.clone(),
            channel_title: v.channel_title.clone(),
            published_at: v.published_at.map(format_timestamp),
            view_count: v.view_count,
            like_count: v.like_count,
            comment_count: v.comment_count,
            duration: v.duration.clone(),
        }
    }
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Fixed six-decimal rendering keeps float output stable across runs.
pub(crate) fn format_weight(weight: f64) -> String {
    format!("{weight:.6}")
}

fn finish(writer: Writer<Vec<u8>>) -> Result<Vec<u8>, ExportError> {
    writer
        .into_inner()
        .map_err(|e| ExportError::Render(e.into_error()))
}

pub(crate) fn videos(videos: &[Video]) -> Result<Vec<u8>, ExportError> {
    let mut sorted: Vec<&Video> = videos.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let mut writer = Writer::from_writer(Vec::new());
    for video in sorted {
        writer.serialize(VideoRow::from(video))?;
    }
    // `serialize` only emits a header with the first row.
    if videos.is_empty() {
        writer.write_record([
            "video_id",
            "title",
            "description",
            "channel_id",
            "channel_title",
            "published_at",
            "view_count",
            "like_count",
            "comment_count",
            "duration",
        ])?;
    }
    finish(writer)
}

pub(crate) fn users(users: &[User]) -> Result<Vec<u8>, ExportError> {
    let mut sorted: Vec<&User> = users.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(["user_id", "display_name"])?;
    for user in sorted {
        writer.write_record([user.id.as_str(), user.display_name.as_str()])?;
    }
    finish(writer)
}

pub(crate) fn comment_edges(edges: &[CommentEdge]) -> Result<Vec<u8>, ExportError> {
    let mut sorted: Vec<&CommentEdge> = edges.iter().collect();
    sorted.sort_by(|a, b| (&a.user_id, &a.video_id).cmp(&(&b.user_id, &b.video_id)));

    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(["user_id", "video_id", "weight", "comment_ids"])?;
    for edge in sorted {
        let weight = edge.weight.to_string();
        let ids = edge.comment_ids.join(";");
        writer.write_record([
            edge.user_id.as_str(),
            edge.video_id.as_str(),
            weight.as_str(),
            ids.as_str(),
        ])?;
    }
    finish(writer)
}

pub(crate) fn similarity_edges(edges: &[SimilarityEdge]) -> Result<Vec<u8>, ExportError> {
    let mut sorted: Vec<&SimilarityEdge> = edges.iter().collect();
    sorted.sort_by(|a, b| (&a.video_a, &a.video_b).cmp(&(&b.video_a, &b.video_b)));

    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(["video_a", "video_b", "weight"])?;
    for edge in sorted {
        let weight = format_weight(edge.weight);
        writer.write_record([edge.video_a.as_str(), edge.video_b.as_str(), weight.as_str()])?;
    }
    finish(writer)
}

pub(crate) fn comments(comments: &[Comment]) -> Result<Vec<u8>, ExportError> {
    let mut sorted: Vec<&Comment> = comments.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record([
        "comment_id",
        "user_id",
        "video_id",
        "like_count",
        "published_at",
        "text",
    ])?;
    for c in sorted {
        let likes = c.like_count.to_string();
        let published = c.published_at.map(format_timestamp).unwrap_or_default();
        let text = flatten_lines(&c.text);
        writer.write_record([
            c.id.as_str(),
            c.author_id.as_str(),
            c.video_id.as_str(),
            likes.as_str(),
            published.as_str(),
            text.as_str(),
        ])?;
    }
    finish(writer)
}

fn flatten_lines(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Parses `nodes_videos.csv` content. `path` is only used in error messages.
pub(crate) fn parse_videos(input: impl Read, path: &Path) -> Result<Vec<Video>, ExportError> {
    let mut reader = Reader::from_reader(input);
    let mut videos = Vec::new();
    for (idx, row) in reader.deserialize::<VideoRow>().enumerate() {
        let row = row?;
        let published_at = match row.published_at.as_deref() {
            None => None,
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(raw)
                    .map_err(|e| ExportError::InvalidRow {
                        path: path.to_path_buf(),
                        // header is line 1
                        line: idx as u64 + 2,
                        reason: format!("published_at '{raw}': {e}"),
                    })?
                    .with_timezone(&Utc),
            ),
        };
        videos.push(Video {
            id: row.video_id,
            title: row.title,
            description: row.description,
            channel_id: row.channel_id,
            channel_title: row.channel_title,
            published_at,
            view_count: row.view_count,
            like_count: row.like_count,
            comment_count: row.comment_count,
            duration: row.duration,
        });
    }
    Ok(videos)
}
