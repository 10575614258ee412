use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("request_timeout_secs must be greater than zero")]
    InvalidTimeout,

    #[error("page_limit must be greater than zero")]
    InvalidPageLimit,
}
