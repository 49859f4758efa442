//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use antenati_core::download::{DEFAULT_MAX_CONNECTIONS, DEFAULT_WORKERS};

/// Download the page images of a Portale Antenati gallery.
///
/// Pages are saved as `<label>.<ext>` inside a folder named after the
/// gallery metadata (archival context, title and archive id).
#[derive(Parser, Debug)]
#[command(name = "antenati")]
#[command(author, version, about)]
pub struct Args {
    /// Gallery URL (e.g. https://antenati.cultura.gov.it/ark:/12657/an_ua19944535/w9DWR8x)
    pub url: String,

    /// Number of concurrent download tasks (1-64)
    #[arg(short = 'n', long, default_value_t = DEFAULT_WORKERS as u8, value_parser = clap::value_parser!(u8).range(1..=64))]
    pub nthreads: u8,

    /// Maximum simultaneous connections to the image server (1-32)
    #[arg(short = 'c', long, default_value_t = DEFAULT_MAX_CONNECTIONS as u8, value_parser = clap::value_parser!(u8).range(1..=32))]
    pub nconn: u8,

    /// First page to download (1-based)
    #[arg(short = 'f', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub first: u32,

    /// Last page to download (1-based, inclusive; defaults to the last page)
    #[arg(short = 'l', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub last: Option<u32>,

    /// Requested image width in pixels (defaults to full size)
    #[arg(short = 's', long, value_parser = clap::value_parser!(u32).range(1..=20000))]
    pub size: Option<u32>,

    /// Parent directory for the gallery folder (defaults to the current directory)
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Download into an existing, non-empty gallery folder
    #[arg(long)]
    pub force: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://antenati.cultura.gov.it/ark:/12657/an_ua19944535/w9DWR8x";

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["antenati", URL]).unwrap();
        assert_eq!(args.url, URL);
        assert_eq!(args.nthreads, 8); // DEFAULT_WORKERS
        assert_eq!(args.nconn, 4); // DEFAULT_MAX_CONNECTIONS
        assert_eq!(args.first, 1);
        assert!(args.last.is_none());
        assert!(args.size.is_none());
        assert!(args.output_dir.is_none());
        assert!(!args.force);
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_url_is_required() {
        let result = Args::try_parse_from(["antenati"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["antenati", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let result = Args::try_parse_from(["antenati", "--version"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let result = Args::try_parse_from(["antenati", URL, "--invalid-flag"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    // ==================== Concurrency Tests ====================

    #[test]
    fn test_cli_nthreads_and_nconn_short_flags() {
        let args = Args::try_parse_from(["antenati", URL, "-n", "16", "-c", "2"]).unwrap();
        assert_eq!(args.nthreads, 16);
        assert_eq!(args.nconn, 2);
    }

    #[test]
    fn test_cli_nthreads_and_nconn_long_flags() {
        let args =
            Args::try_parse_from(["antenati", URL, "--nthreads", "3", "--nconn", "5"]).unwrap();
        assert_eq!(args.nthreads, 3);
        assert_eq!(args.nconn, 5);
    }

    #[test]
    fn test_cli_nthreads_bounds() {
        assert!(Args::try_parse_from(["antenati", URL, "-n", "1"]).is_ok());
        assert!(Args::try_parse_from(["antenati", URL, "-n", "64"]).is_ok());

        let err = Args::try_parse_from(["antenati", URL, "-n", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        let err = Args::try_parse_from(["antenati", URL, "-n", "65"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_nconn_bounds() {
        assert!(Args::try_parse_from(["antenati", URL, "-c", "32"]).is_ok());

        let err = Args::try_parse_from(["antenati", URL, "-c", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        let err = Args::try_parse_from(["antenati", URL, "-c", "33"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    // ==================== Range and Size Tests ====================

    #[test]
    fn test_cli_first_and_last() {
        let args = Args::try_parse_from(["antenati", URL, "-f", "3", "-l", "10"]).unwrap();
        assert_eq!(args.first, 3);
        assert_eq!(args.last, Some(10));
    }

    #[test]
    fn test_cli_first_zero_rejected() {
        let err = Args::try_parse_from(["antenati", URL, "--first", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_size_flag() {
        let args = Args::try_parse_from(["antenati", URL, "-s", "1200"]).unwrap();
        assert_eq!(args.size, Some(1200));

        let err = Args::try_parse_from(["antenati", URL, "--size", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    // ==================== Output Tests ====================

    #[test]
    fn test_cli_output_dir_and_force() {
        let args =
            Args::try_parse_from(["antenati", URL, "-o", "/tmp/registers", "--force"]).unwrap();
        assert_eq!(args.output_dir, Some(PathBuf::from("/tmp/registers")));
        assert!(args.force);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["antenati", URL, "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["antenati", URL, "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["antenati", URL, "--quiet"]).unwrap();
        assert!(args.quiet);
    }
}
