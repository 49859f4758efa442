//! File configuration and its merge with command-line arguments.
//!
//! The config file is a flat `key = value` list (a subset of TOML) read from
//! `$XDG_CONFIG_HOME/antenati/config.toml`. Values given explicitly on the
//! command line always win; file values replace built-in defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};

use antenati_core::download::{
    CONNECT_TIMEOUT_SECS, MAX_CONNECTIONS, MAX_WORKERS, READ_TIMEOUT_SECS,
};

use crate::cli::Args;

/// Config file name under the application config directory.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name under the config base directory.
const CONFIG_DIR_NAME: &str = "antenati";

/// Defaults read from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FileConfig {
    /// Parent directory for gallery folders.
    pub(crate) output_dir: Option<PathBuf>,
    /// Worker tasks (same range as `--nthreads`).
    pub(crate) nthreads: Option<u8>,
    /// Connection cap (same range as `--nconn`).
    pub(crate) nconn: Option<u8>,
    /// HTTP connect timeout in seconds.
    pub(crate) connect_timeout_secs: Option<u64>,
    /// HTTP per-request timeout in seconds.
    pub(crate) read_timeout_secs: Option<u64>,
    /// Log verbosity.
    pub(crate) verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against the CLI constraints.
    pub(crate) fn validate(&self) -> Result<()> {
        validate_range("nthreads", self.nthreads, MAX_WORKERS)?;
        validate_range("nconn", self.nconn, MAX_CONNECTIONS)?;
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        Ok(())
    }
}

fn validate_range(field: &str, value: Option<u8>, max: usize) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=max).contains(&usize::from(value)) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..={max}");
    }
    Ok(())
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

/// Which arguments were given explicitly on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) output_dir: bool,
    pub(crate) nthreads: bool,
    pub(crate) nconn: bool,
    pub(crate) verbose: bool,
    pub(crate) quiet: bool,
}

/// Parses the process arguments, recording which ones the user typed.
pub(crate) fn parse_cli_with_sources() -> (Args, CliValueSources) {
    let matches = Args::command().get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    let sources = cli_value_sources(&matches);
    (args, sources)
}

fn cli_value_sources(matches: &ArgMatches) -> CliValueSources {
    CliValueSources {
        output_dir: is_commandline_value(matches, "output_dir"),
        nthreads: is_commandline_value(matches, "nthreads"),
        nconn: is_commandline_value(matches, "nconn"),
        verbose: is_commandline_value(matches, "verbose"),
        quiet: is_commandline_value(matches, "quiet"),
    }
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Fills arguments the user did not type from `file_config`.
pub(crate) fn apply_config_defaults(
    mut args: Args,
    cli_sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> Args {
    let Some(file_config) = file_config else {
        return args;
    };

    if !cli_sources.output_dir
        && let Some(output_dir) = &file_config.output_dir
    {
        args.output_dir = Some(output_dir.clone());
    }

    if !cli_sources.nthreads
        && let Some(nthreads) = file_config.nthreads
    {
        args.nthreads = nthreads;
    }

    if !cli_sources.nconn
        && let Some(nconn) = file_config.nconn
    {
        args.nconn = nconn;
    }

    if !cli_sources.verbose
        && !cli_sources.quiet
        && let Some(verbosity) = file_config.verbosity
    {
        match verbosity {
            VerbositySetting::Default => {}
            VerbositySetting::Verbose => args.verbose = 1,
            VerbositySetting::Debug => args.verbose = 2,
            VerbositySetting::Quiet => args.quiet = true,
        }
    }

    args
}

/// Returns the `(connect, read)` HTTP timeouts, file values over defaults.
pub(crate) fn http_timeouts(file_config: Option<&FileConfig>) -> (Duration, Duration) {
    let connect = file_config
        .and_then(|c| c.connect_timeout_secs)
        .unwrap_or(CONNECT_TIMEOUT_SECS);
    let read = file_config
        .and_then(|c| c.read_timeout_secs)
        .unwrap_or(READ_TIMEOUT_SECS);
    (Duration::from_secs(connect), Duration::from_secs(read))
}

/// Maps `-q`/`-v` to the default tracing level.
pub(crate) fn resolve_default_log_level(args: &Args) -> &'static str {
    if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/antenati/config.toml`
/// 2. `$HOME/.config/antenati/config.toml`
pub(crate) fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file from the default path; a missing file is not an error.
pub(crate) fn load_default_file_config() -> Result<Option<FileConfig>> {
    let Some(path) = resolve_default_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    load_file_config(&path).map(Some)
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_number = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_number}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let context = || format!("Invalid `{key}` value on line {line_number}");

        match key {
            "output_dir" => {
                let parsed = parse_string_literal(value).with_context(context)?;
                cfg.output_dir = Some(PathBuf::from(parsed));
            }
            "nthreads" => cfg.nthreads = Some(parse_integer_u8(value).with_context(context)?),
            "nconn" => cfg.nconn = Some(parse_integer_u8(value).with_context(context)?),
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(context)?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_number}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_number}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u8(raw_value: &str) -> Result<u8> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<u16>()?;
    u8::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u8"))
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    Ok(token.parse::<u64>()?)
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}
