use crate::Result;
use crate::facts::CollectionRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use core::fmt::Write;
use ohno::app_err;
use serde::Serialize;

/// Column order of the CSV output.
pub const CSV_COLUMNS: [&str; 20] = [
    "full_name",
    "archived",
    "fork",
    "license",
    "stars",
    "forks",
    "watchers",
    "issues_open",
    "issues_closed",
    "prs_open",
    "prs_closed",
    "prs_merged",
    "releases",
    "contributors_count",
    "created_at",
    "updated_at",
    "pushed_at",
    "last_commit_at",
    "top_language",
    "topics",
];

/// One flattened CSV line. Field order must match [`CSV_COLUMNS`].
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    full_name: &'a str,
    archived: bool,
    fork: bool,
    license: Option<&'a str>,
    stars: Option<u64>,
    forks: Option<u64>,
    watchers: Option<u64>,
    issues_open: Option<u64>,
    issues_closed: Option<u64>,
    prs_open: Option<u64>,
    prs_closed: Option<u64>,
    prs_merged: Option<u64>,
    releases: Option<u64>,
    contributors_count: u64,
    created_at: Option<String>,
    updated_at: Option<String>,
    pushed_at: Option<String>,
    last_commit_at: Option<String>,
    top_language: Option<&'a str>,
    topics: String,
}

impl<'a> From<&'a CollectionRecord> for CsvRow<'a> {
    fn from(record: &'a CollectionRecord) -> Self {
        Self {
            full_name: &record.full_name,
            archived: record.archived,
            fork: record.fork,
            license: record.license.as_deref(),
            stars: record.stars,
            forks: record.forks,
            watchers: record.watchers,
            issues_open: record.issues_open,
            issues_closed: record.issues_closed,
            prs_open: record.prs_open,
            prs_closed: record.prs_closed,
            prs_merged: record.prs_merged,
            releases: record.releases,
            contributors_count: record.contributors_count,
            created_at: record.created_at.map(timestamp),
            updated_at: record.updated_at.map(timestamp),
            pushed_at: record.pushed_at.map(timestamp),
            last_commit_at: record.last_commit_at.map(timestamp),
            top_language: record.top_language(),
            topics: record.topics.join(","),
        }
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Write a header line followed by one line per record. Unknown values become empty cells.
pub fn generate<W: Write>(records: &[CollectionRecord], writer: &mut W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    csv_writer.write_record(CSV_COLUMNS)?;
    for record in records {
        csv_writer.serialize(CsvRow::from(record))?;
    }

    let bytes = csv_writer.into_inner().map_err(|e| app_err!("unable to flush CSV output: {}", e.error()))?;
    writer.write_str(&String::from_utf8(bytes)?)?;
    Ok(())
}
