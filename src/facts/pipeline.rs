//! Organization-wide collection.
//!
//! A run goes through four stages:
//!
//! 1. **Listing**: page through `/orgs/{org}/repos` (all types, sorted by full name).
//! 2. **Filtering**: drop archived repositories and forks unless asked to keep them, and stop
//!    listing once `max_repos` repositories have been accepted.
//! 3. **Collecting**: run the [`Collector`] on each repository in listing order. A failure is
//!    logged and that repository is left out; the run carries on.
//! 4. **Serializing**: handled by the caller through [`crate::reports`].

use super::paginator::paginate;
use super::record::{CollectionRecord, RepoDescriptor};
use super::Collector;
use crate::Result;
use core::pin::pin;
use futures::TryStreamExt;
use ohno::IntoAppError;

const LOG_TARGET: &str = "   pipeline";

/// Which repositories of the organization to collect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Filters {
    pub include_archived: bool,
    pub include_forks: bool,

    /// Stop after this many accepted repositories. Zero means no limit.
    pub max_repos: usize,
}

impl Filters {
    #[must_use]
    pub const fn accepts(&self, repo: &RepoDescriptor) -> bool {
        (self.include_archived || !repo.archived) && (self.include_forks || !repo.fork)
    }
}

/// The repositories accepted so far by a [`Filters`], in listing order.
#[derive(Debug)]
struct Selection {
    filters: Filters,
    accepted: Vec<RepoDescriptor>,
    seen: usize,
}

impl Selection {
    const fn new(filters: Filters) -> Self {
        Self {
            filters,
            accepted: Vec::new(),
            seen: 0,
        }
    }

    /// `max_repos` repositories have been accepted; nothing more will be.
    const fn is_full(&self) -> bool {
        self.filters.max_repos != 0 && self.accepted.len() >= self.filters.max_repos
    }

    /// Offer the next listed repository. Returns whether it was kept.
    fn offer(&mut self, repo: RepoDescriptor) -> bool {
        if self.is_full() {
            return false;
        }

        self.seen += 1;
        if !self.filters.accepts(&repo) {
            log::debug!(target: LOG_TARGET, "Skipping '{}' (archived: {}, fork: {})", repo.full_name, repo.archived, repo.fork);
            return false;
        }

        self.accepted.push(repo);
        true
    }

    fn into_accepted(self) -> Vec<RepoDescriptor> {
        log::debug!(target: LOG_TARGET, "Accepted {} of {} listed repositories", self.accepted.len(), self.seen);
        self.accepted
    }
}

#[derive(Debug, Clone)]
pub struct OrgPipeline {
    collector: Collector,
}

impl OrgPipeline {
    #[must_use]
    pub const fn new(collector: Collector) -> Self {
        Self { collector }
    }

    /// List and filter the organization's repositories.
    ///
    /// Listing stops fetching pages as soon as `max_repos` is reached.
    pub async fn list_repos(&self, org: &str, filters: &Filters) -> Result<Vec<RepoDescriptor>> {
        let transport = self.collector.transport();
        let url = transport.config().rest_url(&["orgs", org, "repos"])?;
        let params = [("type", "all".to_string()), ("sort", "full_name".to_string())];

        log::debug!(target: LOG_TARGET, "Listing repositories of '{org}'");

        let mut listing = pin!(paginate::<RepoDescriptor>(transport, &url, &params, transport.config().page_size));
        let mut selection = Selection::new(*filters);

        while !selection.is_full() {
            let Some(repo) = listing
                .try_next()
                .await
                .into_app_err_with(|| format!("listing repositories of organization '{org}'"))?
            else {
                break;
            };

            let _ = selection.offer(repo);
        }

        Ok(selection.into_accepted())
    }

    /// Collect every repository in order, leaving out the ones that fail.
    pub async fn collect_all(&self, repos: &[RepoDescriptor]) -> Vec<CollectionRecord> {
        let total = repos.len();
        let pacing = self.collector.transport().config().pacing;
        let clock = self.collector.transport().clock();
        let mut records = Vec::with_capacity(total);

        for (i, repo) in repos.iter().enumerate() {
            if i > 0 && !pacing.is_zero() {
                clock.delay(pacing).await;
            }

            let n = i + 1;
            match self.collector.collect(repo).await {
                Ok(record) => {
                    log::info!(target: LOG_TARGET, "[{n}/{total}] {} ✓", repo.full_name);
                    records.push(record);
                }
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "[{n}/{total}] {} failed: {e:#}", repo.full_name);
                }
            }
        }

        records
    }

    /// List, filter, and collect. Only a listing failure aborts the run.
    pub async fn run(&self, org: &str, filters: &Filters) -> Result<Vec<CollectionRecord>> {
        let repos = self.list_repos(org, filters).await?;
        log::info!(target: LOG_TARGET, "Found {} repos in {org}", repos.len());

        let records = self.collect_all(&repos).await;
        if records.len() < repos.len() {
            log::warn!(
                target: LOG_TARGET,
                "Collected {} of {} repositories in {org}",
                records.len(),
                repos.len()
            );
        }

        Ok(records)
    }
}
