use crate::app_config::{ApiCredential, AppConfig, DEFAULT_API_BASE_URL};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Credentials are optional here because the CLI may still supply them via
/// `--api-key`; [`AppConfig::ensure_credentials`] performs the final check.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let api_keys = parse_api_keys(optional("YTNET_API_KEYS"), optional("YT_API_KEY"));

    let api_base_url = or_default("YTNET_API_BASE_URL", DEFAULT_API_BASE_URL);
    if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
        return Err(ConfigError::InvalidEnvVar {
            var: "YTNET_API_BASE_URL".to_string(),
            reason: format!("expected an http(s) URL, got '{api_base_url}'"),
        });
    }

    let region_code = optional("YTNET_REGION_CODE");
    let relevance_language = optional("YTNET_RELEVANCE_LANGUAGE");
    let log_level = or_default("YTNET_LOG_LEVEL", "info");

    let request_timeout_secs = parse_u64("YTNET_REQUEST_TIMEOUT_SECS", "30")?;
    if request_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "YTNET_REQUEST_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let user_agent = or_default("YTNET_USER_AGENT", "ytnet/0.1 (network-research)");
    let max_retries = parse_u32("YTNET_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("YTNET_RETRY_BACKOFF_BASE_MS", "1000")?;
    let inter_request_delay_ms = parse_u64("YTNET_INTER_REQUEST_DELAY_MS", "0")?;

    Ok(AppConfig {
        api_keys,
        api_base_url,
        region_code,
        relevance_language,
        log_level,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        inter_request_delay_ms,
    })
}

/// `YTNET_API_KEYS` wins over the single-key `YT_API_KEY` fallback.
fn parse_api_keys(multi: Option<String>, single: Option<String>) -> Vec<ApiCredential> {
    let from_multi: Vec<ApiCredential> = multi
        .as_deref()
        .map(|raw| raw.split(',').filter_map(ApiCredential::parse).collect())
        .unwrap_or_default();
    if !from_multi.is_empty() {
        return from_multi;
    }
    single
        .as_deref()
        .and_then(ApiCredential::parse)
        .into_iter()
        .collect()
}

impl AppConfig {
    /// Fails when no credential is configured at all.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoCredentials`] when `api_keys` is empty.
    pub fn ensure_credentials(&self) -> Result<(), ConfigError> {
        if self.api_keys.is_empty() {
            return Err(ConfigError::NoCredentials);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
