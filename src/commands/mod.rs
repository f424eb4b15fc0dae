//! Command-line interface and orchestration for gh-org-stats
//!
//! This module parses arguments, loads configuration, sets up logging, and drives a
//! collection run from the organization listing through to the written reports.
//!
//! # Implementation Model
//!
//! The `run` function parses command-line arguments using clap and hands them to the
//! `collect` command, which:
//!
//! 1. Initializes logging from `--log-level` (overridable with `RUST_LOG`)
//! 2. Loads the TOML configuration and applies command-line overrides
//! 3. Builds the transport, collector, and org pipeline around a shared `ApiConfig`
//! 4. Runs the pipeline and writes the JSON report (and optionally the CSV report)
//!
//! All output that is not a file goes through a [`Host`] so the command layer can be
//! driven from tests without touching the real stdout.

mod collect;
mod config;
mod host;
mod run;

pub use collect::{CollectArgs, LogLevel, collect_org};
pub use config::{Config, DEFAULT_CONFIG_TOML};
pub use host::Host;
pub use run::run;
