//! The three logical API endpoints driven by the pager.

use crate::archive::slugify;

/// Maximum number of IDs accepted by one `videos.list` call.
pub const VIDEOS_BATCH_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `search.list` restricted to videos.
    Search { query: String },
    /// `videos.list` for up to [`VIDEOS_BATCH_SIZE`] IDs; `batch` numbers the
    /// chunk within the run so each chunk archives under its own name.
    Videos { ids: Vec<String>, batch: usize },
    /// `commentThreads.list` for one video (top-level comments only).
    CommentThreads { video_id: String },
}

impl Endpoint {
    /// REST path segment relative to the API root.
    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            Self::Search { .. } => "search",
            Self::Videos { .. } => "videos",
            Self::CommentThreads { .. } => "commentThreads",
        }
    }

    /// Deterministic archive name, e.g. `search_cats_and_dogs`,
    /// `videos_batch002`, `comments_dQw4w9WgXcQ`.
    #[must_use]
    pub fn archive_name(&self) -> String {
        match self {
            Self::Search { query } => format!("search_{}", slugify(query)),
            Self::Videos { batch, .. } => format!("videos_batch{batch:03}"),
            Self::CommentThreads { video_id } => format!("comments_{video_id}"),
        }
    }

    /// Canonical description of what this endpoint requests, e.g.
    /// `videos?id=a,b&part=snippet,statistics,contentDetails`. Archived with
    /// every page so a replay can tell whether the page answers the same
    /// request. Excludes the key, the cursor and search bias parameters.
    #[must_use]
    pub fn request_id(&self) -> String {
        let params: Vec<String> = self
            .query(None, None)
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        format!("{}?{}", self.path(), params.join("&"))
    }

    /// `maxResults` sent with every request.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        match self {
            Self::Search { .. } | Self::Videos { .. } => 50,
            Self::CommentThreads { .. } => 100,
        }
    }

    /// Endpoint-specific query parameters (without key, cursor or page size).
    pub(crate) fn query(
        &self,
        region_code: Option<&str>,
        relevance_language: Option<&str>,
    ) -> Vec<(&'static str, String)> {
        match self {
            Self::Search { query } => {
                let mut params = vec![
                    ("part", "id".to_owned()),
                    ("q", query.clone()),
                    ("type", "video".to_owned()),
                    ("safeSearch", "none".to_owned()),
                ];
                if let Some(code) = region_code {
                    params.push(("regionCode", code.to_owned()));
                }
                if let Some(lang) = relevance_language {
                    params.push(("relevanceLanguage", lang.to_owned()));
                }
                params
            }
            Self::Videos { ids, .. } => vec![
                ("part", "snippet,statistics,contentDetails".to_owned()),
                ("id", ids.join(",")),
            ],
            Self::CommentThreads { video_id } => vec![
                ("part", "snippet".to_owned()),
                ("videoId", video_id.clone()),
                ("textFormat", "plainText".to_owned()),
                ("order", "relevance".to_owned()),
            ],
        }
    }
}
