use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by the `YouTube` Data API client, the credential pool and
/// the raw page archive.
#[derive(Debug, Error)]
pub enum YoutubeError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected the active key because its quota or rate limit was hit.
    #[error("quota exceeded for key {key_id}: {reason}")]
    QuotaExceeded { key_id: String, reason: String },

    /// Every key in the pool has been exhausted. Fatal for the run.
    #[error("all {keys} API keys exhausted their quota")]
    PoolExhausted { keys: usize },

    /// The pool was built without any key. Fatal for the run.
    #[error("no API keys supplied")]
    NoCredentials,

    /// The API answered with a non-2xx status that is not a quota signal.
    #[error("API error {status} ({reason}): {message}")]
    Api {
        status: u16,
        reason: String,
        message: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A page payload did not have the expected envelope shape.
    #[error("malformed page for {context}: {reason}")]
    MalformedPage { context: String, reason: String },

    /// Reading or writing the raw archive failed.
    #[error("archive I/O error at {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The same archive slot was written twice within one run.
    #[error("page {page_index} of {endpoint} already archived in this run")]
    AlreadyArchived { endpoint: String, page_index: usize },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl YoutubeError {
    /// Transient failures worth another attempt with the same key.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        crate::retry::is_retriable(self)
    }

    /// The active key hit its quota or rate limit; rotate and re-attempt.
    #[must_use]
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }

    /// Conditions that must terminate the whole run instead of skipping a page.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::PoolExhausted { .. }
                | Self::NoCredentials
                | Self::Archive { .. }
                | Self::AlreadyArchived { .. }
                | Self::InvalidBaseUrl { .. }
        )
    }
}

/// Why a single item inside an otherwise valid page was skipped.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("{kind} item has an unexpected shape: {source}")]
    Shape {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} item is missing {field}")]
    Missing {
        kind: &'static str,
        field: &'static str,
    },
}
