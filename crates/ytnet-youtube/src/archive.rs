//! Append-only archive of raw API pages.
//!
//! Every page fetched from the API is written to
//! `<dir>/<endpoint>_page<NNNN>.json` before it is parsed, so a run can be
//! reproduced from disk and an interrupted run can resume: with resume
//! enabled, [`RawArchive::load`] returns previously archived pages and the
//! pager continues from their `nextPageToken` instead of calling the API.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::YoutubeError;

/// One archived API response.
///
/// `key_id` names the credential that served the page; the key secret is
/// never written. `request` is [`crate::Endpoint::request_id`]; pages
/// archived without it never match on replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPage {
    pub endpoint: String,
    #[serde(default)]
    pub request: String,
    pub page_index: usize,
    pub cursor: Option<String>,
    pub key_id: Option<String>,
    pub fetched_at: DateTime<Utc>,
    pub payload: Value,
}

#[derive(Debug)]
pub struct RawArchive {
    dir: PathBuf,
    resume: bool,
    written: HashSet<(String, usize)>,
}

impl RawArchive {
    /// Opens (and creates) the archive directory.
    ///
    /// # Errors
    ///
    /// Returns [`YoutubeError::Archive`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>, resume: bool) -> Result<Self, YoutubeError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| YoutubeError::Archive {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            resume,
            written: HashSet::new(),
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn resume_enabled(&self) -> bool {
        self.resume
    }

    /// Deterministic file path for `(endpoint, page_index)`.
    #[must_use]
    pub fn path_for(&self, endpoint: &str, page_index: usize) -> PathBuf {
        self.dir.join(format!("{endpoint}_page{page_index:04}.json"))
    }

    /// Returns a page archived by an earlier run, if resume is enabled and
    /// the file exists. Corrupt files are logged and treated as missing so
    /// the page is fetched again.
    ///
    /// # Errors
    ///
    /// Returns [`YoutubeError::Archive`] if an existing file cannot be read.
    pub fn load(&self, endpoint: &str, page_index: usize) -> Result<Option<RawPage>, YoutubeError> {
        if !self.resume {
            return Ok(None);
        }
        let path = self.path_for(endpoint, page_index);
        if !path.exists() {
            return Ok(None);
        }
        let body = fs::read_to_string(&path).map_err(|source| YoutubeError::Archive {
            path: path.clone(),
            source,
        })?;
        match serde_json::from_str::<RawPage>(&body) {
            Ok(page) if page.endpoint == endpoint && page.page_index == page_index => Ok(Some(page)),
            Ok(_) => {
                tracing::warn!(path = %path.display(), "archived page does not match its slot, refetching");
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable archived page, refetching");
                Ok(None)
            }
        }
    }

    /// Writes one page. The file is written to a temporary sibling and then
    /// renamed, so an interruption never leaves a truncated page behind.
    ///
    /// # Errors
    ///
    /// - [`YoutubeError::AlreadyArchived`] if this slot was already written in this run.
    /// - [`YoutubeError::Archive`] on I/O failure.
    pub fn store(&mut self, page: &RawPage) -> Result<PathBuf, YoutubeError> {
        let slot = (page.endpoint.clone(), page.page_index);
        if self.written.contains(&slot) {
            return Err(YoutubeError::AlreadyArchived {
                endpoint: page.endpoint.clone(),
                page_index: page.page_index,
            });
        }

        let path = self.path_for(&page.endpoint, page.page_index);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(page).map_err(|e| YoutubeError::Deserialize {
            context: format!("archive {}", path.display()),
            source: e,
        })?;
        fs::write(&tmp, body).map_err(|source| YoutubeError::Archive {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| YoutubeError::Archive {
            path: path.clone(),
            source,
        })?;

        self.written.insert(slot);
        tracing::debug!(path = %path.display(), "archived raw page");
        Ok(path)
    }
}

/// Lowercases alphanumerics and maps every other character to `_`, trimming
/// leading and trailing underscores. Used to name search archives.
#[must_use]
pub fn slugify(s: &str) -> String {
    let mapped: String = s
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() {
                ch.to_lowercase().next().unwrap_or(ch)
            } else {
                '_'
            }
        })
        .collect();
    mapped.trim_matches('_').to_owned()
}
