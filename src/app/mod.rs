//! Application flow for the `antenati` binary.
//!
//! Config merge, gallery resolution, destination setup, the engine run and
//! the final report.

pub(crate) mod config;
pub(crate) mod progress;
pub(crate) mod report;

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use antenati_core::{
    ClientConfig, Concurrency, EngineError, FetchEngine, Gallery, HttpClient, IiifManifestSource,
    Item, ItemRange, prepare_destination,
};
use tracing::{debug, info};

use crate::ProcessExit;
use self::progress::TerminalProgress;

/// Runs one gallery download from the process arguments.
///
/// Fatal preconditions (bad config, unreachable gallery, unusable
/// destination) are returned as errors; per-page failures are reported and
/// mapped to [`ProcessExit::Partial`].
pub(crate) async fn run_antenati() -> Result<ProcessExit> {
    let (args, cli_sources) = config::parse_cli_with_sources();
    let file_config = config::load_default_file_config()?;
    let args = config::apply_config_defaults(args, &cli_sources, file_config.as_ref());

    init_tracing(config::resolve_default_log_level(&args));
    debug!(?args, "CLI arguments parsed");

    let concurrency = Concurrency::new(usize::from(args.nthreads), usize::from(args.nconn))?;
    let (connect_timeout, read_timeout) = config::http_timeouts(file_config.as_ref());
    let client_config = ClientConfig::default()
        .with_max_connections(concurrency.max_connections())
        .with_timeouts(connect_timeout, read_timeout);
    let client = HttpClient::new(&client_config).context("Failed to build HTTP client")?;

    let source = IiifManifestSource::new(client.clone());
    let gallery = Gallery::resolve(&source, &args.url).await?;

    let range = ItemRange::new(args.first as usize, args.last.map(|last| last as usize));
    let selected = gallery.select(range)?;
    let items: Vec<Item> = match args.size {
        Some(width) => selected.iter().map(|item| item.with_width(width)).collect(),
        None => selected.to_vec(),
    };
    info!(
        selected = items.len(),
        available = gallery.items().len(),
        "pages selected"
    );

    let parent = args.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let destination = prepare_destination(&parent, gallery.directory_name(), args.force).await?;

    let bar = if progress::should_use_progress_bar(io::stderr().is_terminal(), args.quiet) {
        TerminalProgress::new()
    } else {
        TerminalProgress::hidden()
    };

    let engine = FetchEngine::new(Arc::new(client));
    let outcome = engine
        .run(&items, concurrency, &destination, &bar)
        .await;
    bar.finish();

    let summary = match outcome {
        Ok(summary) | Err(EngineError::PartialFailure(summary)) => summary,
        Err(e) => return Err(e.into()),
    };

    if !args.quiet || !summary.is_complete() {
        print!("{}", report::render_summary(&summary, &destination));
    }
    Ok(report::exit_outcome(&summary))
}

fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}
