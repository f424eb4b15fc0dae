//! Aggregate counts for one repository via a single GraphQL query.
//!
//! Stars, forks, watchers, issue and pull request totals, releases, and the latest commit
//! date all come back in one round trip instead of paging through REST listings.

use super::record::RepoCounts;
use super::{FetchError, Transport};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

const LOG_TARGET: &str = "  aggregate";

pub const COUNTS_QUERY: &str = r"
query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    stargazerCount
    forkCount
    watchers { totalCount }
    issues(states: OPEN) { totalCount }
    issuesClosed: issues(states: CLOSED) { totalCount }
    pullRequests(states: OPEN) { totalCount }
    pullRequestsClosed: pullRequests(states: CLOSED) { totalCount }
    pullRequestsMerged: pullRequests(states: MERGED) { totalCount }
    releases { totalCount }
    defaultBranchRef {
      target {
        ... on Commit {
          committedDate
          history(first: 1) { edges { node { committedDate } } }
        }
      }
    }
  }
}
";

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepositoryData {
    repository: Option<RepositoryCounts>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryCounts {
    stargazer_count: Option<u64>,
    fork_count: Option<u64>,
    watchers: Option<TotalCount>,
    issues: Option<TotalCount>,
    issues_closed: Option<TotalCount>,
    pull_requests: Option<TotalCount>,
    pull_requests_closed: Option<TotalCount>,
    pull_requests_merged: Option<TotalCount>,
    releases: Option<TotalCount>,
    default_branch_ref: Option<BranchRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TotalCount {
    total_count: u64,
}

#[derive(Debug, Deserialize)]
struct BranchRef {
    target: Option<CommitTarget>,
}

/// The branch tip. Fields stay empty when the target is not a commit.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitTarget {
    committed_date: Option<DateTime<Utc>>,
    history: Option<CommitHistory>,
}

#[derive(Debug, Deserialize)]
struct CommitHistory {
    edges: Option<Vec<Option<CommitEdge>>>,
}

#[derive(Debug, Deserialize)]
struct CommitEdge {
    node: Option<CommitNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitNode {
    committed_date: Option<DateTime<Utc>>,
}

impl CommitTarget {
    /// Prefer the first history entry, fall back to the tip's own date.
    fn last_commit_at(&self) -> Option<DateTime<Utc>> {
        self.history
            .as_ref()
            .and_then(|h| h.edges.as_ref())
            .and_then(|edges| edges.first())
            .and_then(|edge| edge.as_ref()?.node.as_ref()?.committed_date)
            .or(self.committed_date)
    }
}

impl From<RepositoryCounts> for RepoCounts {
    fn from(repo: RepositoryCounts) -> Self {
        let total = |c: Option<TotalCount>| c.map(|c| c.total_count);
        Self {
            stars: repo.stargazer_count,
            forks: repo.fork_count,
            watchers: total(repo.watchers),
            issues_open: total(repo.issues),
            issues_closed: total(repo.issues_closed),
            prs_open: total(repo.pull_requests),
            prs_closed: total(repo.pull_requests_closed),
            prs_merged: total(repo.pull_requests_merged),
            releases: total(repo.releases),
            last_commit_at: repo
                .default_branch_ref
                .and_then(|b| b.target)
                .and_then(|t| t.last_commit_at()),
        }
    }
}

/// Fetch the aggregate counts for `owner/name`.
///
/// A response carrying GraphQL `errors` yields empty counts rather than a failure; HTTP
/// failures and undecodable bodies are still errors.
pub async fn fetch_counts(transport: &Transport, owner: &str, name: &str) -> Result<RepoCounts, FetchError> {
    let body = json!({
        "query": COUNTS_QUERY,
        "variables": { "owner": owner, "name": name },
    });

    let response = transport.post(&transport.config().graphql_url, &body).await?;
    Ok(parse_counts(response.json()?, owner, name))
}

fn parse_counts(response: GraphQlResponse<RepositoryData>, owner: &str, name: &str) -> RepoCounts {
    if let Some(errors) = response.errors {
        let first = errors.first().and_then(|e| e.message.as_deref()).unwrap_or("unknown error");
        log::debug!(target: LOG_TARGET, "Aggregate query for '{owner}/{name}' returned {} error(s): {first}", errors.len());
        return RepoCounts::default();
    }

    response
        .data
        .and_then(|data| data.repository)
        .map(RepoCounts::from)
        .unwrap_or_default()
}
