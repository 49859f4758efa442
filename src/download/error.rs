//! Error types for the download module.
//!
//! Every variant describes the failure of a single item transfer (or of the
//! client construction feeding it). The engine never lets these cross the
//! worker boundary: they are rendered into the run summary instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching and persisting one item.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request or body transfer did not finish within the allotted time.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Response status outside the accepted success set.
    #[error("HTTP error {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// No file extension can be derived from the response content type.
    #[error("cannot determine file type for {url} (content type: {content_type})")]
    UnknownContentType {
        /// The URL whose response was not recognized.
        url: String,
        /// The declared content type, or `<missing>`.
        content_type: String,
    },

    /// File system error while persisting the body.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Another item of the same run already claimed this destination path.
    #[error("destination {path} already claimed by item '{claimed_by}'")]
    DuplicateDestination {
        /// The contested destination path.
        path: PathBuf,
        /// Label of the item that claimed the path first.
        claimed_by: String,
    },

    /// A file not created by this run already exists at the destination path.
    #[error("refusing to overwrite existing file {path}")]
    AlreadyExists {
        /// The existing file.
        path: PathBuf,
    },

    /// The transfer task terminated abnormally (panic or abort).
    #[error("transfer task terminated abnormally: {reason}")]
    TaskFailed {
        /// Description of the abnormal termination.
        reason: String,
    },

    /// A configured header value cannot be sent over HTTP.
    #[error("invalid value for header {name}: {value:?}")]
    InvalidHeader {
        /// Header name.
        name: &'static str,
        /// Rejected value.
        value: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl DownloadError {
    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an unknown content type error.
    pub fn unknown_content_type(url: impl Into<String>, content_type: Option<&str>) -> Self {
        Self::UnknownContentType {
            url: url.into(),
            content_type: content_type.unwrap_or("<missing>").to_string(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a duplicate destination error.
    pub fn duplicate_destination(path: impl Into<PathBuf>, claimed_by: impl Into<String>) -> Self {
        Self::DuplicateDestination {
            path: path.into(),
            claimed_by: claimed_by.into(),
        }
    }

    /// Creates an existing-file error.
    pub fn already_exists(path: impl Into<PathBuf>) -> Self {
        Self::AlreadyExists { path: path.into() }
    }

    /// Creates an abnormal task termination error.
    pub fn task_failed(reason: impl Into<String>) -> Self {
        Self::TaskFailed {
            reason: reason.into(),
        }
    }

    /// Converts a reqwest error into a timeout or network error for `url`.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::timeout(url)
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }
}

// Note on From trait implementations:
// We intentionally do NOT implement `From<reqwest::Error>` or `From<std::io::Error>`
// because our error variants require context (url, path) that the source errors
// don't provide. The helper constructors carry that context instead.
