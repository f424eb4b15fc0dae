//! Command dispatch logic for gh-org-stats

use super::{CollectArgs, collect_org};
use crate::{Host, Result};
use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "gh-org-stats", author, version, long_about = None)]
#[command(about = "Collect aggregate metadata for every repository in a GitHub organization")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(flatten)]
    collect: CollectArgs,
}

/// Parse command-line arguments and run a collection
///
/// This function is designed to be called from main.rs with the program arguments.
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if the organization cannot be listed or an output cannot be written
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    let cli = Cli::parse_from(args);
    collect_org(host, &cli.collect).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["gh-org-stats", "--org", "acme"]).unwrap();
        let args = cli.collect;
        assert_eq!(args.org, "acme");
        assert!(!args.include_archived);
        assert!(!args.include_forks);
        assert_eq!(args.max_repos, 0);
        assert!(args.out.is_none());
        assert!(args.csv.is_none());
        assert_eq!(args.log_level, crate::commands::LogLevel::Info);
    }

    #[test]
    fn test_parse_all_flags() {
        let cli = Cli::try_parse_from([
            "gh-org-stats",
            "--org",
            "acme",
            "--include-archived",
            "--include-forks",
            "--max-repos",
            "5",
            "--out",
            "out/repos.json",
            "--csv",
            "out/repos.csv",
            "--api-url",
            "http://localhost:9999",
            "--log-level",
            "debug",
        ])
        .unwrap();
        let args = cli.collect;
        assert!(args.include_archived);
        assert!(args.include_forks);
        assert_eq!(args.max_repos, 5);
        assert_eq!(args.out.as_deref().map(camino::Utf8Path::as_str), Some("out/repos.json"));
        assert_eq!(args.csv.as_deref().map(camino::Utf8Path::as_str), Some("out/repos.csv"));
        assert_eq!(args.api_url.as_ref().map(url::Url::as_str), Some("http://localhost:9999/"));
    }

    #[test]
    fn test_org_is_required() {
        let _ = Cli::try_parse_from(["gh-org-stats"]).unwrap_err();
    }
}
