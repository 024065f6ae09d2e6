//! Shared domain types and configuration for the `ytnet` collector.

pub mod app_config;
pub mod config;
pub mod types;

use thiserror::Error;

pub use app_config::{AppConfig, ApiCredential, DEFAULT_API_BASE_URL};
pub use config::{load_app_config, load_app_config_from_env};
pub use types::{Comment, CommentEdge, SimilarityEdge, User, Video};

/// Errors raised while building [`AppConfig`]. All of them are fatal: the run
/// aborts before any network call is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("no API credentials configured (set YTNET_API_KEYS or YT_API_KEY, or pass --api-key)")]
    NoCredentials,
}
