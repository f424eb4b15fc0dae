//! Collect aggregate metadata for every repository in a GitHub organization.
//!
//! # Overview
//!
//! `gh-org-stats` lists the repositories of an organization, gathers counts (stars, forks,
//! watchers, issues, pull requests, releases, contributors), topics, language shares, and
//! the latest commit date for each one, and writes the result as JSON and optionally CSV.
//!
//! # Usage
//!
//! ```bash
//! export GITHUB_TOKEN=ghp_...
//! gh-org-stats --org rust-lang --out data/repos.json --csv data/repos.csv
//! ```
//!
//! Archived repositories and forks are skipped unless `--include-archived` or
//! `--include-forks` is given. `--max-repos N` stops after `N` repositories.
//! Without `--out` the JSON array is printed to standard output.
//!
//! # Configuration
//!
//! Connection and retry settings are read from `org-stats.toml` in the working directory
//! when present, or from the file given with `--config`. See `default_config.toml` for
//! every setting and its default.
//!
//! # Rate Limits
//!
//! Requests that hit the API rate limit sleep until the reset time announced by the
//! server and then resume. Transient server errors are retried with backoff. A repository
//! that still fails is logged and left out of the output; the run carries on.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use gh_org_stats::{Host, run};
use std::io::Write;
use std::io::stdout;

/// Default host that writes to the real standard output.
#[derive(Debug, Clone, Default)]
pub struct RealHost;

#[cfg_attr(coverage_nightly, coverage(off))]
impl Host for RealHost {
    fn output(&mut self) -> impl Write {
        stdout()
    }
}

#[tokio::main]
#[cfg_attr(coverage_nightly, coverage(off))]
async fn main() -> Result<(), ohno::AppError> {
    run(&mut RealHost, std::env::args()).await
}
