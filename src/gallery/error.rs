//! Error types for gallery resolution.
//!
//! All of these are fatal preconditions: they are reported before any
//! download starts.

use thiserror::Error;

use crate::download::DownloadError;

/// Errors that can occur while turning a gallery URL into a list of items.
#[derive(Debug, Error)]
pub enum GalleryError {
    /// The gallery URL is malformed.
    #[error("invalid gallery URL: {url}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },

    /// The gallery HTML page could not be fetched.
    #[error("failed to fetch gallery page {url}: {source}")]
    Page {
        /// The gallery page URL.
        url: String,
        /// The underlying fetch error.
        #[source]
        source: DownloadError,
    },

    /// The gallery page does not reference a IIIF manifest.
    #[error("no IIIF manifest reference found in gallery page {url}")]
    ManifestNotFound {
        /// The gallery page URL.
        url: String,
    },

    /// The manifest document could not be fetched.
    #[error("failed to fetch manifest {url}: {source}")]
    Manifest {
        /// The manifest URL.
        url: String,
        /// The underlying fetch error.
        #[source]
        source: DownloadError,
    },

    /// The manifest document is not a valid IIIF presentation manifest.
    #[error("invalid manifest {url}: {source}")]
    InvalidManifest {
        /// The manifest URL.
        url: String,
        /// The JSON decoding error.
        #[source]
        source: serde_json::Error,
    },

    /// The manifest lists no downloadable images.
    #[error("no images found in manifest {url}")]
    NoItems {
        /// The manifest URL.
        url: String,
    },

    /// The requested item range does not select anything.
    #[error("invalid item range {first}..={}: gallery has {available} items", .last.map_or_else(|| "end".to_string(), |l| l.to_string()))]
    InvalidRange {
        /// First requested item (1-based).
        first: usize,
        /// Last requested item (1-based), `None` for "until the end".
        last: Option<usize>,
        /// Number of items in the gallery.
        available: usize,
    },
}
