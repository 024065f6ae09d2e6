use std::fmt::Display;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use ytnet_youtube::{Pager, SkippedPage};

pub(crate) const SUMMARY_FILE: &str = "run_summary.json";

/// Counters for one `collect` run, written to `run_summary.json`.
#[derive(Debug, Default, Serialize)]
pub(crate) struct RunSummary {
    pub query: String,
    pub seeds: usize,
    pub videos: usize,
    pub users: usize,
    pub comments: usize,
    pub duplicate_comments: usize,
    pub comment_edges: usize,
    /// `None` when the similarity graph was not requested.
    pub similarity_edges: Option<usize>,
    pub similarity_excluded: Vec<String>,
    pub pages_fetched: usize,
    pub pages_resumed: usize,
    pub skipped_pages: Vec<SkippedPage>,
    pub skipped_items: usize,
    pub requests_sent: u64,
    pub keys_remaining: usize,
}

impl RunSummary {
    pub(crate) fn new(query: &str) -> Self {
        Self {
            query: query.to_owned(),
            ..Self::default()
        }
    }

    /// Adds a finished pager's page counts and skip record.
    pub(crate) fn absorb(&mut self, pager: &Pager) {
        let stats = pager.stats();
        self.pages_fetched += stats.fetched;
        self.pages_resumed += stats.resumed;
        if let Some(skipped) = pager.skipped() {
            self.skipped_pages.push(skipped.clone());
        }
    }

    pub(crate) fn skip_item(&mut self, kind: &str, reason: &impl Display) {
        tracing::warn!(kind, reason = %reason, "skipping item");
        self.skipped_items += 1;
    }

    pub(crate) fn write(&self, outdir: &Path) -> anyhow::Result<PathBuf> {
        let path = outdir.join(SUMMARY_FILE);
        let body = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}
