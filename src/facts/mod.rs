//! Data collection for the repositories of an organization
//!
//! This module talks to the REST and GraphQL APIs and turns their answers into
//! [`CollectionRecord`]s.
//!
//! # Implementation Model
//!
//! Components build on each other, leaf first:
//! - **Transport**: GET/POST behind `seatbelt` retry layers: bounded retries with backoff
//!   on transient server errors, and rate-limit-aware sleeping. All sleeps go through the
//!   injected [`tick::Clock`].
//! - **Paginator**: a lazy stream over a page-based listing endpoint.
//! - **Aggregate query**: one GraphQL request per repository for all count-type fields.
//! - **Contributor counter**: an exact count from a single `per_page=1` request.
//! - **Collector**: composes the above into one record per repository.
//! - **Org pipeline**: lists, filters, and collects a whole organization, isolating
//!   per-repository failures.
//!
//! Everything runs sequentially; no two requests are ever in flight at once.

mod aggregate;
mod api_config;
mod collector;
mod contributors;
mod error;
mod link_header;
mod paginator;
mod pipeline;
mod record;
mod retry;
mod transport;

pub use aggregate::{COUNTS_QUERY, fetch_counts};
pub use api_config::{ApiConfig, DEFAULT_API_URL, DEFAULT_API_VERSION, DEFAULT_GRAPHQL_URL};
pub use collector::{Collector, languages_pct};
pub use contributors::exact_count;
pub use error::FetchError;
pub use link_header::{LinkHeader, PageLink};
pub use paginator::{PageCursor, paginate};
pub use pipeline::{Filters, OrgPipeline};
pub use record::{CollectionRecord, RepoCounts, RepoDescriptor, RepoLicense, RepoOwner};
pub use retry::{Backoff, RetryPolicy, Verdict};
pub use transport::{ApiResponse, Transport};
