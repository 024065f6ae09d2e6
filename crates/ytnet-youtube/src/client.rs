//! HTTP client for the `YouTube` Data API v3.
//!
//! Wraps `reqwest` with key rotation, retry/back-off and API error
//! classification. The active key is sent in the `x-goog-api-key` header so
//! it never appears in URLs, logs or error messages.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use ytnet_core::AppConfig;

use crate::credentials::CredentialPool;
use crate::endpoint::Endpoint;
use crate::error::YoutubeError;
use crate::retry::retry_with_backoff;
use crate::types::ErrorEnvelope;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Error reasons that mean "this key cannot be used right now".
const QUOTA_REASONS: &[&str] = &[
    "quotaExceeded",
    "dailyLimitExceeded",
    "rateLimitExceeded",
    "userRateLimitExceeded",
];

/// Transport and retry settings for [`YoutubeClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Additional attempts after the first failure for transient errors.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    /// Pause before every network request except the first.
    pub inter_request_delay_ms: u64,
    pub region_code: Option<String>,
    pub relevance_language: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "ytnet/0.1 (network-research)".to_owned(),
            max_retries: 3,
            backoff_base_ms: 1_000,
            inter_request_delay_ms: 0,
            region_code: None,
            relevance_language: None,
        }
    }
}

impl From<&AppConfig> for ClientOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
            inter_request_delay_ms: config.inter_request_delay_ms,
            region_code: config.region_code.clone(),
            relevance_language: config.relevance_language.clone(),
        }
    }
}

/// One successful API response and the key that served it.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub payload: Value,
    pub key_id: String,
}

/// Client for the `YouTube` Data API.
///
/// Owns the [`CredentialPool`]; all calls are sequential (`&mut self`), so
/// key rotation needs no locking.
pub struct YoutubeClient {
    client: Client,
    base_url: Url,
    pool: CredentialPool,
    options: ClientOptions,
    requests_sent: u64,
}

impl YoutubeClient {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`YoutubeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`YoutubeError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(
        pool: CredentialPool,
        base_url: &str,
        options: ClientOptions,
    ) -> Result<Self, YoutubeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(options.user_agent.as_str())
            .build()?;

        // Exactly one trailing slash so `Url::join` appends the endpoint path
        // instead of replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| YoutubeError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            pool,
            options,
            requests_sent: 0,
        })
    }

    /// Builds the pool and client from application configuration.
    ///
    /// # Errors
    ///
    /// See [`CredentialPool::from_credentials`] and [`YoutubeClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, YoutubeError> {
        let pool = CredentialPool::from_credentials(&config.api_keys)?;
        Self::new(pool, &config.api_base_url, ClientOptions::from(config))
    }

    #[must_use]
    pub fn pool(&self) -> &CredentialPool {
        &self.pool
    }

    /// Number of page fetches attempted so far (retries and key rotations
    /// of the same page count once).
    #[must_use]
    pub fn requests_sent(&self) -> u64 {
        self.requests_sent
    }

    /// Fetches one page of `endpoint` at `cursor`.
    ///
    /// Transient failures are retried with back-off. A quota signal marks the
    /// active key exhausted and the same page is re-attempted with the next
    /// key.
    ///
    /// # Errors
    ///
    /// - [`YoutubeError::PoolExhausted`] once every key hit its quota (fatal).
    /// - [`YoutubeError::Api`] for non-quota error statuses.
    /// - [`YoutubeError::Http`] on network failure after all retries.
    /// - [`YoutubeError::Deserialize`] if the body is not JSON.
    pub async fn fetch_page(
        &mut self,
        endpoint: &Endpoint,
        cursor: Option<&str>,
    ) -> Result<FetchedPage, YoutubeError> {
        let url = self.build_url(endpoint, cursor)?;
        self.pace().await;
        loop {
            let key = self.pool.acquire_key()?;
            let key_id = key.id().to_owned();
            let secret = key.secret().to_owned();

            let this = &*self;
            let result = retry_with_backoff(
                this.options.max_retries,
                this.options.backoff_base_ms,
                || this.request_json(&url, &key_id, &secret, endpoint),
            )
            .await;

            match result {
                Ok(payload) => return Ok(FetchedPage { payload, key_id }),
                Err(YoutubeError::QuotaExceeded { reason, .. }) => {
                    tracing::warn!(
                        key_id = %key_id,
                        reason = %reason,
                        endpoint = endpoint.path(),
                        "quota signal, rotating key"
                    );
                    self.pool.report_quota_exceeded(&key_id);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Builds the request URL with percent-encoded query parameters. The key
    /// is not part of the URL.
    fn build_url(&self, endpoint: &Endpoint, cursor: Option<&str>) -> Result<Url, YoutubeError> {
        let mut url = self
            .base_url
            .join(endpoint.path())
            .map_err(|e| YoutubeError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in endpoint.query(
                self.options.region_code.as_deref(),
                self.options.relevance_language.as_deref(),
            ) {
                pairs.append_pair(k, &v);
            }
            pairs.append_pair("maxResults", &endpoint.page_size().to_string());
            if let Some(token) = cursor {
                pairs.append_pair("pageToken", token);
            }
        }
        Ok(url)
    }

    /// Sends one GET request and classifies the response.
    async fn request_json(
        &self,
        url: &Url,
        key_id: &str,
        secret: &str,
        endpoint: &Endpoint,
    ) -> Result<Value, YoutubeError> {
        let response = self
            .client
            .get(url.clone())
            .header(API_KEY_HEADER, secret)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| YoutubeError::Deserialize {
                context: endpoint.archive_name(),
                source: e,
            });
        }
        Err(classify_error(status, &body, key_id))
    }

    /// Applies the configured inter-request delay before every fetch but the first.
    async fn pace(&mut self) {
        if self.requests_sent > 0 && self.options.inter_request_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.options.inter_request_delay_ms)).await;
        }
        self.requests_sent += 1;
    }
}

/// Maps a non-2xx response to a quota signal or a plain API error.
fn classify_error(status: StatusCode, body: &str, key_id: &str) -> YoutubeError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let reason = envelope
        .as_ref()
        .and_then(|e| e.error.errors.first())
        .map(|d| d.reason.clone())
        .unwrap_or_default();
    let message = envelope
        .map(|e| e.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_owned());

    let is_quota = status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && QUOTA_REASONS.contains(&reason.as_str()));
    if is_quota {
        return YoutubeError::QuotaExceeded {
            key_id: key_id.to_owned(),
            reason: if reason.is_empty() {
                "rateLimited".to_owned()
            } else {
                reason
            },
        };
    }

    YoutubeError::Api {
        status: status.as_u16(),
        reason,
        message,
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
