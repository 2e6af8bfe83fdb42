//! Client configuration resolved from the environment at startup

use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the catalog and assistant services
    pub base_url: String,
    /// Deadline for one assistant request; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
    pub restore_input_on_failure: bool,
    pub log_path: PathBuf,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("POET_CHAT_BASE_URL is not a valid URL ({value}): {reason}")]
    InvalidBaseUrl { value: String, reason: String },

    #[error("POET_CHAT_BASE_URL must use http or https, got {0}")]
    UnsupportedScheme(String),

    #[error("{name} must be {expected}, got {value:?}")]
    InvalidValue {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve the configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("POET_CHAT_BASE_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        validate_base_url(&base_url)?;

        let request_timeout = match lookup("POET_CHAT_REQUEST_TIMEOUT_SECS") {
            Some(raw) if !raw.trim().is_empty() => {
                let secs: u64 = raw.trim().parse().ok().filter(|s| *s > 0).ok_or_else(|| {
                    ConfigError::InvalidValue {
                        name: "POET_CHAT_REQUEST_TIMEOUT_SECS",
                        expected: "a positive number of seconds",
                        value: raw.clone(),
                    }
                })?;
                Some(Duration::from_secs(secs))
            }
            _ => None,
        };

        let restore_input_on_failure = match lookup("POET_CHAT_RESTORE_INPUT") {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidValue {
                name: "POET_CHAT_RESTORE_INPUT",
                expected: "a boolean (1/0, true/false, yes/no, on/off)",
                value: raw,
            })?,
            None => false,
        };

        let log_path = lookup("POET_CHAT_LOG_PATH")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(
                || {
                    let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                    PathBuf::from(format!("{home}/.poet-chat/poet-chat.log"))
                },
                PathBuf::from,
            );

        Ok(Self {
            base_url,
            request_timeout,
            restore_input_on_failure,
            log_path,
        })
    }
}

fn validate_base_url(value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidBaseUrl {
        value: value.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Some(false),
        "1" | "true" | "yes" | "on" => Some(true),
        _ => None,
    }
}
