use super::FetchError;
use super::retry::RetryPolicy;
use core::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";
pub const DEFAULT_API_VERSION: &str = "2022-11-28";

/// Everything the HTTP layer needs to talk to the API.
///
/// Built once at startup and shared by every component; nothing in the crate
/// reads connection settings from anywhere else.
#[derive(Clone)]
pub struct ApiConfig {
    pub api_url: Url,
    pub graphql_url: Url,
    pub token: Option<String>,
    pub api_version: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub page_size: u32,

    /// Pause between two repositories in the org pipeline.
    pub pacing: Duration,
    pub retry: RetryPolicy,
}

impl core::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_url", &self.api_url.as_str())
            .field("graphql_url", &self.graphql_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("api_version", &self.api_version)
            .field("user_agent", &self.user_agent)
            .field("request_timeout", &self.request_timeout)
            .field("page_size", &self.page_size)
            .field("pacing", &self.pacing)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ApiConfig {
    /// Settings for the public GitHub API.
    pub fn github(token: Option<String>) -> crate::Result<Self> {
        Ok(Self {
            api_url: Url::parse(DEFAULT_API_URL)?,
            graphql_url: Url::parse(DEFAULT_GRAPHQL_URL)?,
            token,
            api_version: DEFAULT_API_VERSION.to_string(),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout: Duration::from_secs(30),
            page_size: 100,
            pacing: Duration::from_millis(50),
            retry: RetryPolicy::default(),
        })
    }

    /// Build `{api_url}/{segments...}`, percent-encoding each segment.
    pub fn rest_url(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.api_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| FetchError::InvalidUrl {
                base: self.api_url.to_string(),
            })?;
            let _ = path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }
}
