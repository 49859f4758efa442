//! Concurrent fetch-and-persist engine for gallery items.
//!
//! This module downloads every [`Item`](crate::gallery::Item) of a gallery
//! into a destination folder with two independent concurrency knobs: a fixed
//! number of worker tasks and a cap on simultaneous outbound connections.
//!
//! # Features
//!
//! - Bounded worker pool draining a shared backlog (no task per item)
//! - Connection slots that apply backpressure when the server limit is reached
//! - File extension derived from the response `Content-Type`
//! - Write-to-temp-then-link: no partial files are left behind and an
//!   existing file is never replaced
//! - Per-item failures aggregated into a [`RunSummary`], never aborting siblings
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use antenati_core::download::{
//!     ClientConfig, Concurrency, FetchEngine, HttpClient, NoProgress,
//! };
//! use antenati_core::gallery::Item;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(&ClientConfig::default())?;
//! let engine = FetchEngine::new(Arc::new(client));
//! let items = vec![Item::new("c1", "pag. 1", "https://example.com/iiif/1/full/full/0/default.jpg")];
//! let summary = engine
//!     .run(&items, Concurrency::new(8, 4)?, Path::new("./gallery"), &NoProgress)
//!     .await?;
//! println!("Downloaded {} bytes", summary.total_bytes());
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod engine;
mod error;
mod pool;
mod progress;
mod transport;

pub use client::{ClientConfig, HttpClient};
pub use constants::{
    ACCEPTED_STATUS_CODES, CONNECT_TIMEOUT_SECS, DEFAULT_MAX_CONNECTIONS, DEFAULT_WORKERS,
    MAX_CONNECTIONS, MAX_WORKERS, READ_TIMEOUT_SECS,
};
pub use engine::{Concurrency, EngineError, FetchEngine, ItemResult, RunSummary, TransferResult};
pub use error::DownloadError;
pub use pool::{ConnectionPool, ConnectionSlot};
pub use progress::{NoProgress, ProgressSink};
pub use transport::{BodyStream, Transport, TransportResponse};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
