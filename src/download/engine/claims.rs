use std::path::{Path, PathBuf};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::download::DownloadError;

/// Destination paths claimed during one run, with the claiming item's label.
///
/// Claims are never released within a run: a second item resolving to the
/// same file name fails instead of overwriting the first one's file.
#[derive(Debug, Default)]
pub(super) struct PathClaims {
    claimed: DashMap<PathBuf, String>,
}

impl PathClaims {
    pub(super) fn claim(&self, path: &Path, label: &str) -> Result<(), DownloadError> {
        match self.claimed.entry(path.to_path_buf()) {
            Entry::Occupied(existing) => Err(DownloadError::duplicate_destination(
                path,
                existing.get().clone(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(label.to_string());
                Ok(())
            }
        }
    }
}
