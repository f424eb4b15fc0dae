use crate::Result;
use crate::facts::{ApiConfig, Backoff, RetryPolicy};
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use url::Url;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up in the working directory
const CONFIG_FILE_NAME: &str = "org-stats.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// REST API base URL
    pub api_url: Url,

    /// GraphQL endpoint
    pub graphql_url: Url,

    /// Value of the `X-GitHub-Api-Version` header
    pub api_version: String,

    /// User agent sent with every request [default: gh-org-stats/<version>]
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Items per page when listing repositories (1..=100)
    pub page_size: u32,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Pause between two repositories in milliseconds
    pub pacing_ms: u64,

    /// Total attempts for transient failures
    pub max_attempts: u32,

    pub backoff: Backoff,
    pub backoff_step_ms: u64,

    pub rate_limit_default_wait_secs: u64,
    pub rate_limit_margin_secs: u64,
    pub max_rate_limit_waits: u32,
    pub max_rate_limit_wait_secs: u64,
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// An explicit `config_path` must exist. Otherwise `org-stats.toml` in `root` is used when present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation
    pub fn load(root: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = root.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Self::builtin();
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        log::debug!("Loaded configuration from '{final_path}'");
        Ok(config)
    }

    /// The configuration embedded from `default_config.toml`
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded defaults do not parse
    pub fn builtin() -> Result<Self> {
        toml::from_str(DEFAULT_CONFIG_TOML).into_app_err("parsing built-in default configuration")
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a value is out of range
    fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.page_size) {
            return Err(app_err!("page_size must be between 1 and 100, got {}", self.page_size));
        }

        if self.max_attempts == 0 {
            return Err(app_err!("max_attempts must be at least 1"));
        }

        if self.request_timeout_secs == 0 {
            return Err(app_err!("request_timeout_secs must be greater than 0"));
        }

        if self.rate_limit_default_wait_secs > self.max_rate_limit_wait_secs {
            return Err(app_err!(
                "rate_limit_default_wait_secs ({}) must not exceed max_rate_limit_wait_secs ({})",
                self.rate_limit_default_wait_secs,
                self.max_rate_limit_wait_secs
            ));
        }

        if self.api_url.cannot_be_a_base() {
            return Err(app_err!("api_url '{}' cannot be used as a base URL", self.api_url));
        }

        Ok(())
    }

    /// Build the runtime API settings from this configuration
    #[must_use]
    pub fn to_api_config(&self, token: Option<String>) -> ApiConfig {
        ApiConfig {
            api_url: self.api_url.clone(),
            graphql_url: self.graphql_url.clone(),
            token,
            api_version: self.api_version.clone(),
            user_agent: self
                .user_agent
                .clone()
                .unwrap_or_else(|| concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            page_size: self.page_size,
            pacing: Duration::from_millis(self.pacing_ms),
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                backoff: self.backoff,
                backoff_step: Duration::from_millis(self.backoff_step_ms),
                rate_limit_default_wait: Duration::from_secs(self.rate_limit_default_wait_secs),
                rate_limit_margin: Duration::from_secs(self.rate_limit_margin_secs),
                max_rate_limit_waits: self.max_rate_limit_waits,
                max_rate_limit_wait: Duration::from_secs(self.max_rate_limit_wait_secs),
            },
        }
    }
}
