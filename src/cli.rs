//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use kb_export_core::Namespace;

/// Environment variable consulted for the cookie when no flag provides one.
pub const COOKIE_ENV_VAR: &str = "KB_EXPORT_COOKIE";

const AFTER_HELP: &str = "\
Credential sources, first match wins: --cookie, --cookie-file, $KB_EXPORT_COOKIE.
Without any, requests are sent without a cookie.

Exit codes:
  0  every document was exported or already present
  1  some documents failed, others were exported
  2  every attempted document failed, or the export could not start";

/// Export a hosted knowledge base to a local Markdown tree.
///
/// Fetches the catalog of one knowledge base, mirrors its container
/// hierarchy as directories and saves every document as a Markdown file.
/// Documents already present from an earlier run are skipped.
#[derive(Parser, Debug)]
#[command(name = "kb-export")]
#[command(author, version, about, after_help = AFTER_HELP)]
pub struct Args {
    /// Numeric id of the catalog to export
    #[arg(long, value_name = "ID")]
    pub book_id: String,

    /// Knowledge base namespace, written owner/slug
    #[arg(long, value_name = "OWNER/SLUG")]
    pub namespace: Namespace,

    /// Cookie header value sent with every request
    #[arg(long, value_name = "HEADER", conflicts_with = "cookie_file")]
    pub cookie: Option<String>,

    /// JSON file of browser cookies ([{"name": ..., "value": ...}])
    #[arg(long, value_name = "PATH")]
    pub cookie_file: Option<PathBuf>,

    /// Output directory (default: current directory)
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Base delay before every request in milliseconds, plus up to 50% jitter (0 to disable, max 60000)
    #[arg(short = 'l', long, value_name = "MS", value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub rate_limit: Option<u64>,

    /// Attempts per request before giving up (1-10)
    #[arg(short = 'r', long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_attempts: Option<u32>,

    /// Re-download documents that already exist on disk
    #[arg(long)]
    pub refresh: bool,

    /// Service root URL (default: https://www.yuque.com)
    #[arg(long, value_name = "URL")]
    pub service_base: Option<String>,

    /// Config file (default: $XDG_CONFIG_HOME/kb-export/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 5] = [
        "kb-export",
        "--book-id",
        "12345",
        "--namespace",
        "team/handbook",
    ];

    fn parse_with(extra: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(REQUIRED.iter().chain(extra.iter()).copied())
    }

    #[test]
    fn test_cli_required_args_parse_successfully() {
        let args = parse_with(&[]).unwrap();
        assert_eq!(args.book_id, "12345");
        assert_eq!(args.namespace.to_string(), "team/handbook");
        assert!(args.cookie.is_none());
        assert!(args.cookie_file.is_none());
        assert!(args.output_dir.is_none());
        assert!(args.rate_limit.is_none());
        assert!(args.max_attempts.is_none());
        assert!(!args.refresh);
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_missing_book_id_rejected() {
        let result = Args::try_parse_from(["kb-export", "--namespace", "team/handbook"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_invalid_namespace_rejected() {
        let result = Args::try_parse_from([
            "kb-export",
            "--book-id",
            "1",
            "--namespace",
            "just-one-segment",
        ]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["kb-export", "--help"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let result = Args::try_parse_from(["kb-export", "--version"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_cookie_and_cookie_file_conflict() {
        let result = parse_with(&["--cookie", "a=b", "--cookie-file", "cookies.json"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_cli_output_short_and_long() {
        let args = parse_with(&["-o", "out"]).unwrap();
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));

        let args = parse_with(&["--output", "other"]).unwrap();
        assert_eq!(args.output_dir, Some(PathBuf::from("other")));
    }

    #[test]
    fn test_cli_rate_limit_bounds() {
        assert_eq!(parse_with(&["--rate-limit", "0"]).unwrap().rate_limit, Some(0));
        assert_eq!(
            parse_with(&["-l", "60000"]).unwrap().rate_limit,
            Some(60_000)
        );
        let err = parse_with(&["--rate-limit", "60001"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_max_attempts_bounds() {
        assert_eq!(
            parse_with(&["--max-attempts", "1"]).unwrap().max_attempts,
            Some(1)
        );
        assert_eq!(parse_with(&["-r", "10"]).unwrap().max_attempts, Some(10));
        for bad in ["0", "11"] {
            let err = parse_with(&["--max-attempts", bad]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        }
    }

    #[test]
    fn test_cli_refresh_flag() {
        assert!(parse_with(&["--refresh"]).unwrap().refresh);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        assert_eq!(parse_with(&["-v"]).unwrap().verbose, 1);
        assert_eq!(parse_with(&["-vv"]).unwrap().verbose, 2);
    }

    #[test]
    fn test_cli_quiet_conflicts_with_verbose() {
        let err = parse_with(&["-q", "-v"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
