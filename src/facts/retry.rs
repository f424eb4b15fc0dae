//! Retry policy for API requests.
//!
//! The policy classifies each HTTP response as final, transient, or rate limited, and
//! works out how long a rate-limited request must wait. It performs no I/O and no
//! sleeping itself; the transport turns its verdicts into [`seatbelt`] recovery decisions.

use chrono::{DateTime, Utc};
use core::time::Duration;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::{Deserialize, Serialize};

const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// How the delay between transient-failure retries grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// `step * attempt`
    Linear,

    /// `step * 2^(attempt - 1)`
    Exponential,
}

impl From<Backoff> for seatbelt::retry::Backoff {
    fn from(backoff: Backoff) -> Self {
        match backoff {
            Backoff::Linear => Self::Linear,
            Backoff::Exponential => Self::Exponential,
        }
    }
}

/// How a response should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Success or a failure that retrying will not fix.
    Done,

    /// Server-side failure expected to resolve on its own.
    Transient,

    /// Rate limited: wait the given duration, then retry.
    RateLimited(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts for transient failures, including the first one.
    pub max_attempts: u32,
    pub backoff: Backoff,
    pub backoff_step: Duration,

    /// Wait used when a rate-limited response carries no reset information.
    pub rate_limit_default_wait: Duration,

    /// Added to the reset time, and the minimum wait when the reset is already past.
    pub rate_limit_margin: Duration,

    /// Rate-limit waits allowed per request. These do not consume `max_attempts`.
    pub max_rate_limit_waits: u32,

    /// Upper bound for any single rate-limit wait.
    pub max_rate_limit_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Linear,
            backoff_step: Duration::from_millis(1500),
            rate_limit_default_wait: Duration::from_secs(10),
            rate_limit_margin: Duration::from_secs(2),
            max_rate_limit_waits: 10,
            max_rate_limit_wait: Duration::from_secs(3600),
        }
    }
}

impl RetryPolicy {
    /// Server-side failures that are expected to resolve on their own.
    #[must_use]
    pub const fn is_transient(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
        )
    }

    /// A 403 whose body mentions the rate limit, or a 429.
    #[must_use]
    pub fn is_rate_limited(status: StatusCode, body: &[u8]) -> bool {
        if status == StatusCode::TOO_MANY_REQUESTS {
            return true;
        }

        status == StatusCode::FORBIDDEN && String::from_utf8_lossy(body).to_lowercase().contains("rate limit")
    }

    /// How long to wait before retrying a rate-limited request.
    ///
    /// Uses `X-RateLimit-Reset` (epoch seconds) plus the margin, never less than the margin.
    /// Falls back to `Retry-After`, then to the default wait. Always capped.
    #[must_use]
    pub fn rate_limit_wait(&self, headers: &HeaderMap, now: DateTime<Utc>) -> Duration {
        let wait = if let Some(reset) = header_number::<i64>(headers, RATE_LIMIT_RESET_HEADER) {
            let margin = i64::try_from(self.rate_limit_margin.as_secs()).unwrap_or(i64::MAX);
            let secs = reset.saturating_sub(now.timestamp()).saturating_add(margin).max(margin);
            Duration::from_secs(secs.unsigned_abs())
        } else if let Some(secs) = header_number::<u64>(headers, RETRY_AFTER.as_str()) {
            Duration::from_secs(secs)
        } else {
            self.rate_limit_default_wait
        };

        wait.min(self.max_rate_limit_wait)
    }

    /// Classify a response. Attempt budgets are enforced by the caller.
    #[must_use]
    pub fn classify(&self, status: StatusCode, headers: &HeaderMap, body: &[u8], now: DateTime<Utc>) -> Verdict {
        if status.is_success() {
            return Verdict::Done;
        }

        if Self::is_rate_limited(status, body) {
            return Verdict::RateLimited(self.rate_limit_wait(headers, now));
        }

        if Self::is_transient(status) {
            return Verdict::Transient;
        }

        Verdict::Done
    }
}

fn header_number<T: core::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}
