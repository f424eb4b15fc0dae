use super::record::{CollectionRecord, RepoDescriptor};
use super::{FetchError, Transport, aggregate, contributors};
use crate::Result;
use chrono::{DurationRound, TimeDelta};
use indexmap::IndexMap;
use ohno::IntoAppError;
use serde::Deserialize;

const LOG_TARGET: &str = "  collector";

#[derive(Debug, Deserialize)]
struct Topics {
    #[serde(default)]
    names: Vec<String>,
}

/// Builds one [`CollectionRecord`] per repository.
#[derive(Debug, Clone)]
pub struct Collector {
    transport: Transport,
}

impl Collector {
    #[must_use]
    pub const fn new(transport: Transport) -> Self {
        Self { transport }
    }

    #[must_use]
    pub const fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Gather counts, topics, languages, and contributors for `repo`, in that order.
    ///
    /// Any failure is returned to the caller; nothing is retried at this level.
    pub async fn collect(&self, repo: &RepoDescriptor) -> Result<CollectionRecord> {
        let owner = repo.owner();
        let name = repo.name.as_str();
        let full_name = &repo.full_name;

        log::debug!(target: LOG_TARGET, "Collecting '{full_name}'");

        let counts = aggregate::fetch_counts(&self.transport, owner, name)
            .await
            .into_app_err_with(|| format!("fetching aggregate counts for '{full_name}'"))?;

        let topics = self
            .fetch_topics(owner, name)
            .await
            .into_app_err_with(|| format!("fetching topics for '{full_name}'"))?;

        let languages = self
            .fetch_languages_pct(owner, name)
            .await
            .into_app_err_with(|| format!("fetching languages for '{full_name}'"))?;

        let contributors = contributors::exact_count(&self.transport, owner, name)
            .await
            .into_app_err_with(|| format!("counting contributors for '{full_name}'"))?;

        let now = self.transport.now();
        let collected_at = now.duration_trunc(TimeDelta::seconds(1)).unwrap_or(now);

        Ok(CollectionRecord::new(repo, counts, topics, languages, contributors, collected_at))
    }

    async fn fetch_topics(&self, owner: &str, name: &str) -> Result<Vec<String>, FetchError> {
        let url = self.transport.config().rest_url(&["repos", owner, name, "topics"])?;
        match self.transport.get(&url, &[]).await? {
            Some(response) => Ok(response.json::<Topics>()?.names),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_languages_pct(&self, owner: &str, name: &str) -> Result<IndexMap<String, f64>, FetchError> {
        let url = self.transport.config().rest_url(&["repos", owner, name, "languages"])?;
        match self.transport.get(&url, &[]).await? {
            Some(response) => Ok(languages_pct(&response.json()?)),
            None => Ok(IndexMap::new()),
        }
    }
}

/// Convert per-language byte counts into percentages rounded to two decimals.
///
/// Entries keep their input order, which for the languages endpoint is largest share first.
#[expect(clippy::cast_precision_loss, reason = "byte counts are far below 2^52")]
#[must_use]
pub fn languages_pct(bytes: &IndexMap<String, u64>) -> IndexMap<String, f64> {
    let total = bytes.values().sum::<u64>().max(1) as f64;

    bytes
        .iter()
        .map(|(lang, &count)| (lang.clone(), (count as f64 * 100.0 / total * 100.0).round() / 100.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(entries: &[(&str, u64)]) -> IndexMap<String, u64> {
        entries.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn test_languages_pct() {
        let pct = languages_pct(&bytes(&[("Rust", 7000), ("Go", 3000)]));
        assert_eq!(pct["Rust"], 70.0);
        assert_eq!(pct["Go"], 30.0);
    }

    #[test]
    fn test_languages_pct_rounding() {
        let pct = languages_pct(&bytes(&[("A", 1), ("B", 1), ("C", 1)]));
        assert_eq!(pct["A"], 33.33);
        let sum: f64 = pct.values().sum();
        assert!((sum - 100.0).abs() < 0.05);
    }

    #[test]
    fn test_languages_pct_empty_and_zero() {
        assert!(languages_pct(&IndexMap::new()).is_empty());
        let pct = languages_pct(&bytes(&[("Shell", 0)]));
        assert_eq!(pct["Shell"], 0.0);
    }

    #[test]
    fn test_languages_pct_keeps_server_order() {
        let decoded: IndexMap<String, u64> = serde_json::from_str(r#"{"Rust":9000,"C":500,"Ada":500}"#).unwrap();
        let pct = languages_pct(&decoded);
        assert_eq!(pct.keys().map(String::as_str).collect::<Vec<_>>(), ["Rust", "C", "Ada"]);
    }

    #[test]
    fn test_topics_without_names_field() {
        let topics: Topics = serde_json::from_str("{}").unwrap();
        assert!(topics.names.is_empty());
    }
}
