//! HTTP transport with retry, backoff, and rate-limit handling.
//!
//! Every request runs through a [`seatbelt`] stack of two retry layers. The inner layer
//! retries transient failures (network errors, 502/503/504) with backoff, up to
//! `max_attempts` in total. The outer layer waits out rate limits, up to
//! `max_rate_limit_waits` times, so those waits never use up transient attempts. Both
//! layers ask the [`RetryPolicy`] to classify each response and sleep on the injected
//! [`Clock`].

use super::retry::{RetryPolicy, Verdict};
use super::{ApiConfig, FetchError};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use layered::{Execute, Service, Stack};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use seatbelt::retry::Retry;
use seatbelt::{RecoveryInfo, ResilienceContext};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tick::Clock;
use url::Url;

const LOG_TARGET: &str = "  transport";
const API_VERSION_HEADER: &str = "x-github-api-version";
const ACCEPT_GITHUB_JSON: &str = "application/vnd.github+json";
const APPLICATION_JSON: &str = "application/json";
/// A fully-read response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    url: String,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ApiResponse {
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Decode the body, reporting shape mismatches as [`FetchError::MalformedResponse`].
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_slice(&self.body).map_err(|e| FetchError::malformed(&self.url, e))
    }
}

#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    config: Arc<ApiConfig>,
    clock: Clock,
}

/// One request as handed to the retry stack. Cloned for every attempt.
#[derive(Debug, Clone)]
enum Outgoing {
    Get { url: Url, query: Vec<(String, String)> },
    Post { url: Url, body: Bytes },
}

impl Outgoing {
    const fn url(&self) -> &Url {
        match self {
            Self::Get { url, .. } | Self::Post { url, .. } => url,
        }
    }
}

type Outcome = Result<ApiResponse, FetchError>;

impl Transport {
    pub fn new(config: Arc<ApiConfig>, clock: Clock) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_GITHUB_JSON));

        if let Some(token) = &config.token {
            let mut auth_val = HeaderValue::from_str(&format!("Bearer {token}"))?;
            auth_val.set_sensitive(true);
            let _ = headers.insert(AUTHORIZATION, auth_val);
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config, clock })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    #[must_use]
    pub const fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Current wall-clock time as seen by the injected clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        utc_now(&self.clock)
    }

    /// GET a REST resource. A 404 yields `Ok(None)`.
    pub async fn get(&self, url: &Url, params: &[(&str, String)]) -> Result<Option<ApiResponse>, FetchError> {
        let query = params.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect();
        let response = self.send(Outgoing::Get { url: url.clone(), query }).await?;

        if response.status == StatusCode::NOT_FOUND {
            log::debug!(target: LOG_TARGET, "'{url}' not found (404)");
            return Ok(None);
        }

        self.accept(response).map(Some)
    }

    /// POST a JSON body. Unlike [`Self::get`], a 404 is a failure.
    pub async fn post<B: Serialize + ?Sized>(&self, url: &Url, body: &B) -> Result<ApiResponse, FetchError> {
        let body = serde_json::to_vec(body).map_err(|source| FetchError::Encode {
            url: url.to_string(),
            source,
        })?;

        let response = self
            .send(Outgoing::Post {
                url: url.clone(),
                body: Bytes::from(body),
            })
            .await?;

        self.accept(response)
    }

    /// Turn the last response the retry stack produced into the caller's result.
    fn accept(&self, response: ApiResponse) -> Result<ApiResponse, FetchError> {
        if response.status.is_success() {
            return Ok(response);
        }

        if RetryPolicy::is_rate_limited(response.status, &response.body) {
            return Err(FetchError::RateLimitExhausted {
                url: response.url,
                waits: self.config.retry.max_rate_limit_waits,
            });
        }

        Err(FetchError::Status {
            url: response.url,
            status: response.status,
        })
    }

    async fn send(&self, outgoing: Outgoing) -> Outcome {
        let policy = &self.config.retry;
        let context = ResilienceContext::new(&self.clock).name("github_api");
        let url = outgoing.url().to_string();

        let rate_limit_policy = policy.clone();
        let rate_limit_clock = self.clock.clone();
        let transient_policy = policy.clone();
        let transient_clock = self.clock.clone();
        let transient_url = url.clone();
        let client = self.client.clone();
        let api_version = self.config.api_version.clone();

        let service = (
            Retry::layer("rate_limit", &context)
                .clone_input()
                .recovery_with(move |result: &Outcome, _| {
                    match verdict(&rate_limit_policy, result, utc_now(&rate_limit_clock)) {
                        Verdict::RateLimited(wait) => RecoveryInfo::retry().delay(wait),
                        Verdict::Transient | Verdict::Done => RecoveryInfo::never(),
                    }
                })
                .max_retry_attempts(policy.max_rate_limit_waits)
                .on_retry(|_output, args| {
                    log::warn!(target: LOG_TARGET, "Rate limit reached; sleeping {}s", args.retry_delay().as_secs());
                }),
            Retry::layer("transient", &context)
                .clone_input()
                .recovery_with(move |result: &Outcome, _| {
                    match verdict(&transient_policy, result, utc_now(&transient_clock)) {
                        Verdict::Transient => RecoveryInfo::retry(),
                        Verdict::RateLimited(_) | Verdict::Done => RecoveryInfo::never(),
                    }
                })
                .max_retry_attempts(policy.max_attempts.saturating_sub(1))
                .base_delay(policy.backoff_step)
                .backoff(policy.backoff.into())
                .on_retry(move |_output, args| {
                    log::debug!(
                        target: LOG_TARGET,
                        "Retrying '{transient_url}' (attempt {}, delay {}ms)",
                        args.attempt().index() + 1,
                        args.retry_delay().as_millis()
                    );
                }),
            Execute::new(move |outgoing: Outgoing| {
                let client = client.clone();
                let api_version = api_version.clone();
                async move { send_once(&client, &api_version, outgoing).await }
            }),
        )
            .into_service();

        service.execute(outgoing).await
    }
}

fn utc_now(clock: &Clock) -> DateTime<Utc> {
    DateTime::<Utc>::from(clock.system_time())
}

fn verdict(policy: &RetryPolicy, result: &Outcome, now: DateTime<Utc>) -> Verdict {
    match result {
        Ok(response) => policy.classify(response.status, &response.headers, &response.body, now),
        Err(FetchError::Network { .. }) => Verdict::Transient,
        Err(_) => Verdict::Done,
    }
}

async fn send_once(client: &reqwest::Client, api_version: &str, outgoing: Outgoing) -> Outcome {
    let url = outgoing.url().to_string();
    let request = match outgoing {
        Outgoing::Get { url, query } => client.get(url).header(API_VERSION_HEADER, api_version).query(&query),
        Outgoing::Post { url, body } => client.post(url).header(CONTENT_TYPE, APPLICATION_JSON).body(body),
    };

    let network = |source| FetchError::Network { url: url.clone(), source };
    let resp = request.send().await.map_err(network)?;
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = resp.bytes().await.map_err(network)?;

    Ok(ApiResponse {
        url,
        status,
        headers,
        body,
    })
}
