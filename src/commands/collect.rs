use super::Config;
use crate::facts::{CollectionRecord, Collector, Filters, OrgPipeline, Transport};
use crate::reports::{generate_csv, generate_json};
use crate::{Host, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, ValueEnum};
use ohno::IntoAppError;
use std::fs;
use std::io::Write;
use std::sync::Arc;
use tick::Clock;
use url::Url;

const LOG_TARGET: &str = "    collect";

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,
    /// Only error messages
    Error,
    /// Warning and error messages
    Warn,
    /// Info, warning, and error messages
    Info,
    /// Debug and above messages
    Debug,
    /// All messages including trace
    Trace,
}

#[derive(Args, Debug)]
pub struct CollectArgs {
    /// GitHub organization to collect
    #[arg(long, value_name = "ORG")]
    pub org: String,

    /// Include archived repositories
    #[arg(long)]
    pub include_archived: bool,

    /// Include forked repositories
    #[arg(long)]
    pub include_forks: bool,

    /// Stop after this many repositories (0 means no limit)
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub max_repos: usize,

    /// Write the JSON report to this file instead of standard output
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub out: Option<Utf8PathBuf>,

    /// Also write a CSV report to this file
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub csv: Option<Utf8PathBuf>,

    /// Path to configuration file [default: org-stats.toml if present]
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Override the REST API base URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<Url>,

    /// Override the GraphQL endpoint
    #[arg(long, value_name = "URL")]
    pub graphql_url: Option<Url>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: LogLevel,
}

impl CollectArgs {
    const fn filters(&self) -> Filters {
        Filters {
            include_archived: self.include_archived,
            include_forks: self.include_forks,
            max_repos: self.max_repos,
        }
    }
}

/// Collect every matching repository of `args.org` and write the reports
///
/// # Errors
///
/// Returns an error if configuration is invalid, the organization cannot be listed,
/// or a report cannot be written. Failures on individual repositories are logged and skipped.
pub async fn collect_org<H: Host>(host: &mut H, args: &CollectArgs) -> Result<()> {
    init_logging(args.log_level);

    let mut config = Config::load(Utf8Path::new("."), args.config.as_ref())?;
    if let Some(url) = &args.api_url {
        config.api_url = url.clone();
    }
    if let Some(url) = &args.graphql_url {
        config.graphql_url = url.clone();
    }

    let api_config = config.to_api_config(args.github_token.clone());
    if api_config.token.is_none() {
        log::warn!(target: LOG_TARGET, "No GitHub token provided; unauthenticated requests are heavily rate limited");
    }

    let transport = Transport::new(Arc::new(api_config), Clock::new_tokio())?;
    let pipeline = OrgPipeline::new(Collector::new(transport));

    let records = pipeline.run(&args.org, &args.filters()).await?;

    write_json(host, &records, args.out.as_deref())?;
    if let Some(path) = &args.csv {
        write_csv(&records, path)?;
    }

    Ok(())
}

fn write_json<H: Host>(host: &mut H, records: &[CollectionRecord], path: Option<&Utf8Path>) -> Result<()> {
    let mut text = String::new();
    generate_json(records, &mut text)?;

    match path {
        Some(path) => {
            write_file(path, &text)?;
            log::info!(target: LOG_TARGET, "Wrote JSON → {path}");
        }
        None => {
            writeln!(host.output(), "{text}").into_app_err("writing JSON to standard output")?;
        }
    }

    Ok(())
}

fn write_csv(records: &[CollectionRecord], path: &Utf8Path) -> Result<()> {
    let mut text = String::new();
    generate_csv(records, &mut text)?;
    write_file(path, &text)?;
    log::info!(target: LOG_TARGET, "Wrote CSV → {path}");
    Ok(())
}

fn write_file(path: &Utf8Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        fs::create_dir_all(parent).into_app_err_with(|| format!("creating directory '{parent}'"))?;
    }

    fs::write(path, contents).into_app_err_with(|| format!("writing '{path}'"))
}

fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    // A logger may already be installed when commands run more than once in a process.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .try_init();
}
