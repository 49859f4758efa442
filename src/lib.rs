//! Antenati Core Library
//!
//! This library provides the core functionality for the antenati tool,
//! which downloads the page images of a Portale Antenati gallery (a IIIF
//! manifest of scanned register pages) into a local folder.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`gallery`] - Gallery page and IIIF manifest resolution into items
//! - [`naming`] - Folder and file name generation (slugs, extensions)
//! - [`destination`] - Destination folder preparation before a run
//! - [`download`] - Bounded concurrent fetch-and-persist engine

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod destination;
pub mod download;
pub mod gallery;
pub mod naming;
mod user_agent;

// Re-export commonly used types
pub use destination::{DestinationError, prepare_destination};
pub use download::{
    ClientConfig, Concurrency, DEFAULT_MAX_CONNECTIONS, DEFAULT_WORKERS, DownloadError,
    EngineError, FetchEngine, HttpClient, ItemResult, NoProgress, ProgressSink, RunSummary,
    TransferResult, Transport, TransportResponse,
};
pub use gallery::{
    Gallery, GalleryError, IiifManifestSource, Item, ItemRange, Manifest, ManifestSource,
    Metadata,
};
