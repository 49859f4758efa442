//! Fetch engine: bounded concurrent download of gallery items.
//!
//! This module provides the `FetchEngine` which downloads a list of items
//! into a destination folder using a fixed pool of worker tasks and a
//! separate cap on simultaneous connections.
//!
//! # Overview
//!
//! All items are placed in one shared backlog. `workers` tasks drain it; each
//! task acquires a connection slot before issuing its request and releases
//! it once the body is on disk. Each item ends in exactly one
//! [`TransferResult`], delivered over a channel to the collector (the `run`
//! future itself), which notifies the [`ProgressSink`] and builds the
//! [`RunSummary`].
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use antenati_core::download::{ClientConfig, Concurrency, EngineError, FetchEngine, HttpClient, NoProgress};
//! use antenati_core::gallery::Item;
//!
//! # async fn example(items: Vec<Item>) -> Result<(), Box<dyn std::error::Error>> {
//! let engine = FetchEngine::new(Arc::new(HttpClient::new(&ClientConfig::default())?));
//! match engine.run(&items, Concurrency::default(), Path::new("./out"), &NoProgress).await {
//!     Ok(summary) => println!("{} bytes", summary.total_bytes()),
//!     Err(EngineError::PartialFailure(summary)) => {
//!         for (label, reason) in summary.failures() {
//!             eprintln!("{label}: {reason}");
//!         }
//!     }
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

mod claims;
mod task;

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use self::claims::PathClaims;
use self::task::{TransferContext, transfer_item};
use super::constants::{DEFAULT_MAX_CONNECTIONS, DEFAULT_WORKERS, MAX_CONNECTIONS, MAX_WORKERS};
use super::{ConnectionPool, DownloadError, ProgressSink, Transport};
use crate::gallery::Item;

/// Minimum allowed value for both concurrency knobs.
const MIN_CONCURRENCY: usize = 1;

/// Error type for a whole engine run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error("invalid {knob} value {value}: must be between {MIN_CONCURRENCY} and {max}")]
    InvalidConcurrency {
        /// Which knob was rejected (`workers` or `connections`).
        knob: &'static str,
        /// The invalid value that was provided.
        value: usize,
        /// The upper bound for that knob.
        max: usize,
    },

    /// Destination directory missing or unusable; no worker was started.
    #[error("destination {path} is unusable: {reason}")]
    Destination {
        /// The destination directory.
        path: PathBuf,
        /// Why it cannot be used.
        reason: String,
    },

    /// At least one item failed; carries the complete summary.
    #[error("{} of {} items failed", .0.failures().len(), .0.results().len())]
    PartialFailure(RunSummary),
}

impl EngineError {
    /// Returns the run summary carried by a partial failure.
    #[must_use]
    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            Self::PartialFailure(summary) => Some(summary),
            _ => None,
        }
    }
}

/// Worker and connection budget for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Concurrency {
    workers: usize,
    max_connections: usize,
}

impl Default for Concurrency {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl Concurrency {
    /// Creates a budget of `workers` tasks sharing `max_connections` slots.
    ///
    /// The two knobs are independent: the server limits connections, not
    /// logical tasks.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if either value is outside
    /// its valid range (1..=64 workers, 1..=32 connections).
    pub fn new(workers: usize, max_connections: usize) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_WORKERS).contains(&workers) {
            return Err(EngineError::InvalidConcurrency {
                knob: "workers",
                value: workers,
                max: MAX_WORKERS,
            });
        }
        if !(MIN_CONCURRENCY..=MAX_CONNECTIONS).contains(&max_connections) {
            return Err(EngineError::InvalidConcurrency {
                knob: "connections",
                value: max_connections,
                max: MAX_CONNECTIONS,
            });
        }
        Ok(Self {
            workers,
            max_connections,
        })
    }

    /// Returns the number of worker tasks.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Returns the number of simultaneous connections.
    #[must_use]
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}

/// Terminal outcome of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferResult {
    /// The body was written to `path`.
    Success {
        /// Body length in bytes.
        bytes_written: u64,
        /// Final file path.
        path: PathBuf,
    },
    /// The item could not be fetched or persisted.
    Failure {
        /// Human-readable reason.
        reason: String,
    },
}

impl TransferResult {
    fn from_error(error: &DownloadError) -> Self {
        Self::Failure {
            reason: error.to_string(),
        }
    }

    /// Returns `true` for [`TransferResult::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// An item's result, tagged with its manifest position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemResult {
    /// 1-based position in the submitted item list.
    pub index: usize,
    /// Item identifier.
    pub id: String,
    /// Item label.
    pub label: String,
    /// Outcome.
    pub result: TransferResult,
}

/// Aggregated outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    total_bytes: u64,
    failures: BTreeMap<String, String>,
    results: Vec<ItemResult>,
}

impl RunSummary {
    fn from_results(results: Vec<ItemResult>) -> Self {
        let mut total_bytes = 0u64;
        let mut failures = BTreeMap::new();
        for entry in &results {
            match &entry.result {
                TransferResult::Success { bytes_written, .. } => {
                    total_bytes = total_bytes.saturating_add(*bytes_written);
                }
                TransferResult::Failure { reason } => {
                    let key = unique_failure_key(&failures, &entry.label, entry.index);
                    failures.insert(key, reason.clone());
                }
            }
        }
        Self {
            total_bytes,
            failures,
            results,
        }
    }

    /// Sum of bytes written by successful transfers.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Failed items, keyed by label.
    #[must_use]
    pub fn failures(&self) -> &BTreeMap<String, String> {
        &self.failures
    }

    /// Per-item results in submission order.
    #[must_use]
    pub fn results(&self) -> &[ItemResult] {
        &self.results
    }

    /// Number of successful transfers.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.result.is_success()).count()
    }

    /// Returns `true` when no item failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Picks a failure map key for `label` that no earlier failure uses.
///
/// Labels are not unique, and a suffixed key such as `"a #3"` may itself be
/// a real label, so suffixes are tried until one is free.
fn unique_failure_key(failures: &BTreeMap<String, String>, label: &str, index: usize) -> String {
    if !failures.contains_key(label) {
        return label.to_string();
    }
    let mut key = format!("{label} #{index}");
    let mut attempt = 1usize;
    while failures.contains_key(&key) {
        attempt += 1;
        key = format!("{label} #{index}.{attempt}");
    }
    key
}

/// Unit of work in the shared backlog.
struct WorkItem {
    index: usize,
    item: Item,
}

type Backlog = Arc<Mutex<VecDeque<WorkItem>>>;

/// Concurrent fetch-and-persist engine.
///
/// The engine is generic over its [`Transport`] so the HTTP stack can be
/// replaced in tests. It holds no per-run state: connection slots, path
/// claims and the backlog are created by each [`run`](Self::run) call.
///
/// # Concurrency Model
///
/// - `min(workers, items)` Tokio tasks drain one shared backlog
/// - A connection slot is held for the request and the body write (RAII)
/// - Each transfer runs in its own task so a panic becomes a failed item
/// - Results flow through one channel to a single collector
#[derive(Debug)]
pub struct FetchEngine<T> {
    transport: Arc<T>,
    item_timeout: Option<Duration>,
}

impl<T: Transport + 'static> FetchEngine<T> {
    /// Creates an engine issuing requests through `transport`.
    #[must_use]
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            item_timeout: None,
        }
    }

    /// Bounds each transfer (request and body write, after a connection slot
    /// was obtained) to `timeout`. A timed-out item fails; it is not retried.
    #[must_use]
    pub fn with_item_timeout(mut self, timeout: Duration) -> Self {
        self.item_timeout = Some(timeout);
        self
    }

    /// Downloads every item into `destination`.
    ///
    /// This method:
    /// 1. Reports `set_total(items.len())` to `progress`
    /// 2. Validates the destination directory (it is never created here)
    /// 3. Starts `min(workers, items)` workers over a shared backlog
    /// 4. Collects exactly one result per item, calling `progress.update()`
    /// 5. Returns the aggregated summary once every item is terminal
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Destination`] if `destination` is not an
    /// existing directory (no request is made), or
    /// [`EngineError::PartialFailure`] carrying the full summary when at
    /// least one item failed.
    ///
    /// Note: individual item failures never abort sibling transfers.
    #[instrument(skip(self, items, destination, progress), fields(items = items.len(), destination = %destination.display()))]
    pub async fn run(
        &self,
        items: &[Item],
        concurrency: Concurrency,
        destination: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<RunSummary, EngineError> {
        progress.set_total(items.len());

        if items.is_empty() {
            info!("no items to download");
            return Ok(RunSummary::default());
        }

        ensure_destination(destination).await?;

        let context = TransferContext {
            transport: Arc::clone(&self.transport),
            pool: ConnectionPool::new(concurrency.max_connections()),
            claims: Arc::new(PathClaims::default()),
            destination: destination.to_path_buf(),
            item_timeout: self.item_timeout,
        };

        let backlog: Backlog = Arc::new(Mutex::new(
            items
                .iter()
                .cloned()
                .enumerate()
                .map(|(index, item)| WorkItem { index, item })
                .collect(),
        ));

        let worker_count = concurrency.workers().min(items.len());
        info!(
            workers = worker_count,
            max_connections = concurrency.max_connections(),
            "starting gallery download"
        );

        let (result_tx, mut result_rx) = mpsc::unbounded_channel();
        let workers: Vec<JoinHandle<()>> = (0..worker_count)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    Arc::clone(&backlog),
                    context.clone(),
                    result_tx.clone(),
                ))
            })
            .collect();
        // The channel closes once every worker has exited.
        drop(result_tx);

        let mut slots: Vec<Option<TransferResult>> = vec![None; items.len()];
        while let Some((index, result)) = result_rx.recv().await {
            if let Some(slot) = slots.get_mut(index)
                && slot.is_none()
            {
                *slot = Some(result);
                progress.update();
            }
        }

        for handle in workers {
            // Ignore JoinError - transfers already run in their own task
            if let Err(e) = handle.await {
                warn!(error = %e, "download worker terminated abnormally");
            }
        }

        let results: Vec<ItemResult> = items
            .iter()
            .zip(slots)
            .enumerate()
            .map(|(index, (item, slot))| {
                let result = slot.unwrap_or_else(|| {
                    // Only reachable if every worker died before draining the backlog.
                    progress.update();
                    TransferResult::from_error(&DownloadError::task_failed(
                        "no worker left to process the item",
                    ))
                });
                ItemResult {
                    index: index + 1,
                    id: item.id().to_string(),
                    label: item.label().to_string(),
                    result,
                }
            })
            .collect();

        let summary = RunSummary::from_results(results);
        info!(
            succeeded = summary.succeeded(),
            failed = summary.failures().len(),
            total_bytes = summary.total_bytes(),
            "gallery download complete"
        );

        if summary.is_complete() {
            Ok(summary)
        } else {
            Err(EngineError::PartialFailure(summary))
        }
    }
}

async fn ensure_destination(destination: &Path) -> Result<(), EngineError> {
    let metadata =
        tokio::fs::metadata(destination)
            .await
            .map_err(|e| EngineError::Destination {
                path: destination.to_path_buf(),
                reason: e.to_string(),
            })?;
    if !metadata.is_dir() {
        return Err(EngineError::Destination {
            path: destination.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    Ok(())
}

fn next_work_item(backlog: &Backlog) -> Option<WorkItem> {
    backlog
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pop_front()
}

async fn worker_loop<T: Transport + 'static>(
    worker_id: usize,
    backlog: Backlog,
    context: TransferContext<T>,
    results: mpsc::UnboundedSender<(usize, TransferResult)>,
) {
    debug!(worker_id, "worker started");

    while let Some(WorkItem { index, item }) = next_work_item(&backlog) {
        let task_context = context.clone();
        let task_item = item.clone();
        let handle = tokio::spawn(async move { transfer_item(&task_context, &task_item).await });

        let result = match handle.await {
            Ok(Ok(outcome)) => {
                debug!(worker_id, label = %item.label(), path = %outcome.path.display(), bytes = outcome.bytes_written, "item saved");
                TransferResult::Success {
                    bytes_written: outcome.bytes_written,
                    path: outcome.path,
                }
            }
            Ok(Err(e)) => {
                warn!(worker_id, label = %item.label(), url = %item.source_url(), error = %e, "item failed");
                TransferResult::from_error(&e)
            }
            Err(join_error) => {
                warn!(worker_id, label = %item.label(), error = %join_error, "transfer task panicked");
                TransferResult::from_error(&DownloadError::task_failed(join_error.to_string()))
            }
        };

        if results.send((index, result)).is_err() {
            // Collector is gone; nothing left to report to.
            break;
        }
    }

    debug!(worker_id, "worker finished");
}
