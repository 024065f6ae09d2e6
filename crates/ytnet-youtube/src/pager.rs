//! Cursor-carrying page sequence over one endpoint.
//!
//! A [`Pager`] starts at the first page, follows `nextPageToken` cursors and
//! stops when `max_items` items have been produced, when the API stops
//! returning a cursor, or when a page has to be skipped. It is not
//! restartable: a new fetch needs a new `Pager`.
//!
//! Every page obtained from the network is archived before its items are
//! extracted. When the archive was opened with resume enabled, pages already
//! on disk are replayed instead of fetched.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::archive::{RawArchive, RawPage};
use crate::client::YoutubeClient;
use crate::endpoint::Endpoint;
use crate::error::YoutubeError;

/// Maximum number of pages per sequence. Guards against cycling cursors.
pub const MAX_PAGES: usize = 500;

/// A page the pager gave up on. The sequence ends at this page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPage {
    pub endpoint: String,
    pub page_index: usize,
    pub reason: String,
}

/// Per-sequence counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PagerStats {
    /// Pages obtained from the API.
    pub fetched: usize,
    /// Pages replayed from the archive.
    pub resumed: usize,
    /// Items produced across all pages.
    pub items: usize,
}

#[derive(Debug)]
pub struct Pager {
    endpoint: Endpoint,
    name: String,
    request: String,
    max_items: usize,
    cursor: Option<String>,
    page_index: usize,
    done: bool,
    stats: PagerStats,
    skipped: Option<SkippedPage>,
}

impl Pager {
    /// A sequence over `endpoint` producing at most `max_items` items.
    /// `max_items == 0` yields nothing.
    #[must_use]
    pub fn new(endpoint: Endpoint, max_items: usize) -> Self {
        let name = endpoint.archive_name();
        let request = endpoint.request_id();
        Self {
            endpoint,
            name,
            request,
            max_items,
            cursor: None,
            page_index: 0,
            done: max_items == 0,
            stats: PagerStats::default(),
            skipped: None,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    #[must_use]
    pub fn stats(&self) -> PagerStats {
        self.stats
    }

    #[must_use]
    pub fn skipped(&self) -> Option<&SkippedPage> {
        self.skipped.as_ref()
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Produces the items of the next page, or `None` once the sequence has
    /// ended.
    ///
    /// Non-fatal failures (4xx, malformed pages, exhausted retries) end the
    /// sequence and are recorded in [`Pager::skipped`].
    ///
    /// # Errors
    ///
    /// Returns only fatal errors: [`YoutubeError::PoolExhausted`] and
    /// archive failures.
    pub async fn next_page(
        &mut self,
        client: &mut YoutubeClient,
        archive: &mut RawArchive,
    ) -> Result<Option<Vec<Value>>, YoutubeError> {
        if self.done {
            return Ok(None);
        }
        let index = self.page_index;
        if index >= MAX_PAGES {
            self.skip(index, format!("pagination limit of {MAX_PAGES} pages reached"));
            return Ok(None);
        }

        let payload = match self.replay(archive, index)? {
            Some(payload) => payload,
            None => match client.fetch_page(&self.endpoint, self.cursor.as_deref()).await {
                Ok(fetched) => {
                    let raw = RawPage {
                        endpoint: self.name.clone(),
                        request: self.request.clone(),
                        page_index: index,
                        cursor: self.cursor.clone(),
                        key_id: Some(fetched.key_id),
                        fetched_at: Utc::now(),
                        payload: fetched.payload,
                    };
                    archive.store(&raw)?;
                    self.stats.fetched += 1;
                    raw.payload
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    self.skip(index, e.to_string());
                    return Ok(None);
                }
            },
        };

        let Some((mut items, next)) = split_page(payload) else {
            let err = YoutubeError::MalformedPage {
                context: self.name.clone(),
                reason: "response has no items array".to_owned(),
            };
            self.skip(index, err.to_string());
            return Ok(None);
        };

        items.truncate(self.max_items - self.stats.items);
        self.stats.items += items.len();
        self.page_index += 1;

        let cycled = next.is_some() && next == self.cursor;
        if cycled {
            tracing::warn!(endpoint = %self.name, page = index, "cursor repeated, stopping");
        }
        self.cursor = next;
        if self.stats.items >= self.max_items || self.cursor.is_none() || cycled {
            self.done = true;
        }

        tracing::debug!(
            endpoint = %self.name,
            page = index,
            items = items.len(),
            done = self.done,
            "page processed"
        );
        Ok(Some(items))
    }

    /// Returns the archived payload for `index` if it answered the same
    /// request at the cursor this sequence is currently at.
    fn replay(&mut self, archive: &RawArchive, index: usize) -> Result<Option<Value>, YoutubeError> {
        let Some(page) = archive.load(&self.name, index)? else {
            return Ok(None);
        };
        if page.request != self.request {
            tracing::warn!(
                endpoint = %self.name,
                page = index,
                "archived page answered a different request, refetching"
            );
            return Ok(None);
        }
        if page.cursor != self.cursor {
            tracing::warn!(
                endpoint = %self.name,
                page = index,
                "archived page was fetched with a different cursor, refetching"
            );
            return Ok(None);
        }
        self.stats.resumed += 1;
        tracing::debug!(endpoint = %self.name, page = index, "replaying archived page");
        Ok(Some(page.payload))
    }

    fn skip(&mut self, page_index: usize, reason: String) {
        tracing::warn!(
            endpoint = %self.name,
            page = page_index,
            reason = %reason,
            "skipping page"
        );
        self.skipped = Some(SkippedPage {
            endpoint: self.name.clone(),
            page_index,
            reason,
        });
        self.done = true;
    }
}

/// Splits a list response into its items and next cursor. `None` when the
/// payload is not a `{ "items": [...] }` object.
fn split_page(payload: Value) -> Option<(Vec<Value>, Option<String>)> {
    let Value::Object(mut map) = payload else {
        return None;
    };
    let next = map
        .get("nextPageToken")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_owned);
    match map.remove("items") {
        Some(Value::Array(items)) => Some((items, next)),
        _ => None,
    }
}
