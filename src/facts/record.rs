use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A repository as returned by the organization listing endpoint.
///
/// Only the fields the collector needs are decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoDescriptor {
    pub name: String,
    pub full_name: String,
    pub owner: RepoOwner,
    pub html_url: String,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub default_branch: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub fork: bool,
    pub license: Option<RepoLicense>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoOwner {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoLicense {
    pub name: Option<String>,
}

impl RepoDescriptor {
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner.login
    }

    #[must_use]
    pub fn license_name(&self) -> Option<&str> {
        self.license.as_ref().and_then(|l| l.name.as_deref())
    }
}

/// Counts fetched by the aggregate query. All `None` when the query reported errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoCounts {
    pub stars: Option<u64>,
    pub forks: Option<u64>,
    pub watchers: Option<u64>,
    pub issues_open: Option<u64>,
    pub issues_closed: Option<u64>,
    pub prs_open: Option<u64>,
    pub prs_closed: Option<u64>,
    pub prs_merged: Option<u64>,
    pub releases: Option<u64>,
    pub last_commit_at: Option<DateTime<Utc>>,
}

/// One repository's snapshot, the unit written to the JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub full_name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub default_branch: Option<String>,
    pub archived: bool,
    pub fork: bool,
    pub license: Option<String>,
    pub topics: Vec<String>,
    /// Byte share per language, in the order the server listed them.
    pub languages_pct: IndexMap<String, f64>,

    pub stars: Option<u64>,
    pub forks: Option<u64>,
    pub watchers: Option<u64>,
    pub issues_open: Option<u64>,
    pub issues_closed: Option<u64>,
    pub prs_open: Option<u64>,
    pub prs_closed: Option<u64>,
    pub prs_merged: Option<u64>,
    pub releases: Option<u64>,
    pub last_commit_at: Option<DateTime<Utc>>,

    pub contributors_count: u64,

    pub collected_at: DateTime<Utc>,
}

impl CollectionRecord {
    /// Merge a listing entry with the separately fetched data.
    #[must_use]
    pub fn new(
        repo: &RepoDescriptor,
        counts: RepoCounts,
        topics: Vec<String>,
        languages_pct: IndexMap<String, f64>,
        contributors_count: u64,
        collected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            full_name: repo.full_name.clone(),
            html_url: repo.html_url.clone(),
            description: repo.description.clone(),
            created_at: repo.created_at,
            updated_at: repo.updated_at,
            pushed_at: repo.pushed_at,
            default_branch: repo.default_branch.clone(),
            archived: repo.archived,
            fork: repo.fork,
            license: repo.license_name().map(str::to_string),
            topics,
            languages_pct,
            stars: counts.stars,
            forks: counts.forks,
            watchers: counts.watchers,
            issues_open: counts.issues_open,
            issues_closed: counts.issues_closed,
            prs_open: counts.prs_open,
            prs_closed: counts.prs_closed,
            prs_merged: counts.prs_merged,
            releases: counts.releases,
            last_commit_at: counts.last_commit_at,
            contributors_count,
            collected_at,
        }
    }

    /// The language with the highest byte share. Ties go to the one the server listed first.
    #[must_use]
    pub fn top_language(&self) -> Option<&str> {
        self.languages_pct
            .iter()
            .fold(None, |best: Option<(&String, f64)>, (lang, &pct)| match best {
                Some((_, best_pct)) if best_pct >= pct => best,
                _ => Some((lang, pct)),
            })
            .map(|(lang, _)| lang.as_str())
    }
}
