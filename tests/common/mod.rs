//! Shared helpers for integration tests

#![expect(dead_code, reason = "each test binary uses a different subset of the helpers")]

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use core::time::Duration;
use gh_org_stats::facts::{ApiConfig, Transport};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::SystemTime;
use tick::{Clock, ClockControl};
use url::Url;
use wiremock::MockServer;

/// API settings pointing both the REST and GraphQL endpoints at `server`.
pub fn api_config(server: &MockServer) -> ApiConfig {
    let mut config = ApiConfig::github(Some("t0k".to_string())).unwrap();
    config.api_url = Url::parse(&server.uri()).unwrap();
    config.graphql_url = Url::parse(&format!("{}/graphql", server.uri())).unwrap();
    config.pacing = Duration::ZERO;
    config
}

/// A clock whose timers fire at once, moving its time forward by the delay instead.
pub fn controlled_clock() -> Clock {
    ClockControl::new().auto_advance_timers(true).to_clock()
}

pub fn transport_with_clock(config: ApiConfig, clock: Clock) -> Transport {
    Transport::new(Arc::new(config), clock).unwrap()
}

/// Transport backed by a fresh controlled clock, returned alongside so tests can measure waits.
pub fn controlled_transport(config: ApiConfig) -> (Transport, Clock) {
    let clock = controlled_clock();
    let transport = transport_with_clock(config, clock.clone());
    (transport, clock)
}

/// Virtual time that passed on `clock` since `start`.
pub fn elapsed(clock: &Clock, start: SystemTime) -> Duration {
    clock.system_time().duration_since(start).unwrap_or_default()
}

/// The clock's current time as stamped on records.
pub fn record_time(clock: &Clock) -> DateTime<Utc> {
    let now = DateTime::<Utc>::from(clock.system_time());
    now.duration_trunc(TimeDelta::seconds(1)).unwrap()
}

/// A repository entry as returned by the organization listing.
pub fn repo_json(org: &str, name: &str, archived: bool, fork: bool) -> Value {
    json!({
        "id": 1,
        "name": name,
        "full_name": format!("{org}/{name}"),
        "owner": { "login": org },
        "html_url": format!("https://github.com/{org}/{name}"),
        "description": format!("The {name} repository"),
        "created_at": "2020-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z",
        "pushed_at": "2023-12-31T12:00:00Z",
        "default_branch": "main",
        "archived": archived,
        "fork": fork,
        "license": { "key": "mit", "name": "MIT License" }
    })
}

/// A successful aggregate query answer with every count set to `n`.
pub fn counts_json(n: u64) -> Value {
    json!({
        "data": {
            "repository": {
                "stargazerCount": n,
                "forkCount": n,
                "watchers": { "totalCount": n },
                "issues": { "totalCount": n },
                "issuesClosed": { "totalCount": n },
                "pullRequests": { "totalCount": n },
                "pullRequestsClosed": { "totalCount": n },
                "pullRequestsMerged": { "totalCount": n },
                "releases": { "totalCount": n },
                "defaultBranchRef": {
                    "target": {
                        "committedDate": "2024-01-01T00:00:00Z",
                        "history": { "edges": [ { "node": { "committedDate": "2024-01-02T00:00:00Z" } } ] }
                    }
                }
            }
        }
    })
}
