/// Default root of the `YouTube` Data API v3.
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";

/// One API credential as supplied by the operator.
///
/// `label` is an optional human-readable name (`label=secret` syntax in
/// `YTNET_API_KEYS`); when absent the credential pool derives a fingerprint.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredential {
    pub label: Option<String>,
    pub secret: String,
}

impl ApiCredential {
    /// Parses either `secret` or `label=secret`. Surrounding whitespace is
    /// trimmed; returns `None` for an empty entry.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.split_once('=') {
            Some((label, secret)) if !label.trim().is_empty() && !secret.trim().is_empty() => {
                Some(Self {
                    label: Some(label.trim().to_owned()),
                    secret: secret.trim().to_owned(),
                })
            }
            _ => Some(Self {
                label: None,
                secret: raw.to_owned(),
            }),
        }
    }
}

impl std::fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredential")
            .field("label", &self.label)
            .field("secret", &"[redacted]")
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub api_keys: Vec<ApiCredential>,
    pub api_base_url: String,
    pub region_code: Option<String>,
    pub relevance_language: Option<String>,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub inter_request_delay_ms: u64,
}

impl AppConfig {
    /// Applies command-line overrides on top of the environment-derived
    /// values. Keys given on the command line replace the environment keys
    /// entirely.
    #[must_use]
    pub fn with_overrides(
        mut self,
        api_keys: &[String],
        region_code: Option<&str>,
        relevance_language: Option<&str>,
    ) -> Self {
        let cli_keys: Vec<ApiCredential> =
            api_keys.iter().filter_map(|k| ApiCredential::parse(k)).collect();
        if !cli_keys.is_empty() {
            self.api_keys = cli_keys;
        }
        if let Some(code) = region_code {
            self.region_code = Some(code.to_owned());
        }
        if let Some(lang) = relevance_language {
            self.relevance_language = Some(lang.to_owned());
        }
        self
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_keys", &format!("[{} redacted]", self.api_keys.len()))
            .field("api_base_url", &self.api_base_url)
            .field("region_code", &self.region_code)
            .field("relevance_language", &self.relevance_language)
            .field("log_level", &self.log_level)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .finish()
    }
}
