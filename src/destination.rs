//! Destination folder preparation.
//!
//! Each gallery is saved under `<parent>/<folder name>`. A fresh folder is
//! created; an existing one is reused only when empty or when the caller
//! explicitly allows mixing with existing content.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument};

/// Errors preparing the destination folder.
#[derive(Debug, Error)]
pub enum DestinationError {
    /// The path exists but is not a directory.
    #[error("destination {path} exists and is not a directory")]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// The folder already contains files and reuse was not allowed.
    #[error("destination {path} already exists and is not empty (use --force to reuse it)")]
    NotEmpty {
        /// The existing folder.
        path: PathBuf,
    },

    /// Filesystem operation failed.
    #[error("IO error at {path}: {source}")]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl DestinationError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Creates (or validates) `parent/folder_name` and returns its path.
///
/// Missing parents are created. Existing files are never removed or
/// overwritten here; the fetch engine refuses to replace them as well.
///
/// # Errors
///
/// - [`DestinationError::NotADirectory`] if the path exists as a file
/// - [`DestinationError::NotEmpty`] if the folder has entries and
///   `allow_non_empty` is `false`
/// - [`DestinationError::Io`] on any filesystem failure
#[instrument]
pub async fn prepare_destination(
    parent: &Path,
    folder_name: &str,
    allow_non_empty: bool,
) -> Result<PathBuf, DestinationError> {
    let path = parent.join(folder_name);

    match tokio::fs::metadata(&path).await {
        Ok(metadata) if !metadata.is_dir() => {
            return Err(DestinationError::NotADirectory { path });
        }
        Ok(_) => {
            let mut entries = tokio::fs::read_dir(&path)
                .await
                .map_err(|e| DestinationError::io(&path, e))?;
            let has_entries = entries
                .next_entry()
                .await
                .map_err(|e| DestinationError::io(&path, e))?
                .is_some();
            if has_entries && !allow_non_empty {
                return Err(DestinationError::NotEmpty { path });
            }
            debug!(path = %path.display(), has_entries, "reusing existing destination");
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tokio::fs::create_dir_all(&path)
                .await
                .map_err(|e| DestinationError::io(&path, e))?;
            info!(path = %path.display(), "created destination folder");
        }
        Err(e) => return Err(DestinationError::io(&path, e)),
    }

    Ok(path)
}
