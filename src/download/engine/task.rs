use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};

use super::claims::PathClaims;
use crate::download::constants::{ACCEPTED_STATUS_CODES, PARTIAL_FILE_PREFIX, PARTIAL_FILE_SUFFIX};
use crate::download::{BodyStream, ConnectionPool, DownloadError, Transport};
use crate::gallery::Item;
use crate::naming;

/// Shared, per-run state handed to every transfer.
pub(super) struct TransferContext<T> {
    pub(super) transport: Arc<T>,
    pub(super) pool: ConnectionPool,
    pub(super) claims: Arc<PathClaims>,
    pub(super) destination: PathBuf,
    pub(super) item_timeout: Option<Duration>,
}

impl<T> Clone for TransferContext<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            pool: self.pool.clone(),
            claims: Arc::clone(&self.claims),
            destination: self.destination.clone(),
            item_timeout: self.item_timeout,
        }
    }
}

/// A file written by a successful transfer.
#[derive(Debug)]
pub(super) struct SavedItem {
    pub(super) path: PathBuf,
    pub(super) bytes_written: u64,
}

/// Fetches one item and writes it under the destination directory.
///
/// The connection slot is held from the request until the body is on disk.
/// The optional timeout starts once the slot is obtained, so queueing behind
/// a saturated pool never counts against an item.
#[instrument(skip(ctx, item), fields(label = %item.label(), url = %item.source_url()))]
pub(super) async fn transfer_item<T: Transport>(
    ctx: &TransferContext<T>,
    item: &Item,
) -> Result<SavedItem, DownloadError> {
    let _slot = ctx.pool.acquire().await?;

    let work = fetch_and_persist(ctx, item);
    match ctx.item_timeout {
        Some(limit) => tokio::time::timeout(limit, work)
            .await
            .map_err(|_| DownloadError::timeout(item.source_url()))?,
        None => work.await,
    }
}

async fn fetch_and_persist<T: Transport>(
    ctx: &TransferContext<T>,
    item: &Item,
) -> Result<SavedItem, DownloadError> {
    let url = item.source_url();
    let response = ctx.transport.get(url).await?;

    if !ACCEPTED_STATUS_CODES.contains(&response.status) {
        return Err(DownloadError::http_status(url, response.status));
    }

    let content_type = response.content_type.as_deref();
    let file_name = content_type
        .and_then(|ct| naming::file_name(item.label(), ct))
        .ok_or_else(|| DownloadError::unknown_content_type(url, content_type))?;
    let path = ctx.destination.join(&file_name);
    debug!(path = %path.display(), "resolved output path");

    ctx.claims.claim(&path, item.label())?;
    if tokio::fs::try_exists(&path)
        .await
        .map_err(|e| DownloadError::io(&path, e))?
    {
        return Err(DownloadError::already_exists(path));
    }

    let bytes_written = persist_body(response.body, &path).await?;
    Ok(SavedItem {
        path,
        bytes_written,
    })
}

/// Streams `body` into a hidden sibling of `path`, then links it into place.
///
/// Either the complete file appears at `path` or nothing does: the temporary
/// file is removed on error, on timeout and on panic. A file that shows up at
/// `path` while the body is streaming is left untouched and the item fails.
pub(super) async fn persist_body(mut body: BodyStream, path: &Path) -> Result<u64, DownloadError> {
    let partial = PartialFile::for_target(path);

    let file = File::create(partial.path())
        .await
        .map_err(|e| DownloadError::io(partial.path(), e))?;
    let mut writer = BufWriter::new(file);
    let mut bytes_written: u64 = 0;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(partial.path(), e))?;
        bytes_written += chunk.len() as u64;
    }

    // Ensure all data is flushed to disk
    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(partial.path(), e))?;
    let file = writer.into_inner();
    file.sync_all()
        .await
        .map_err(|e| DownloadError::io(partial.path(), e))?;
    drop(file);

    // hard_link never replaces an existing target, unlike rename.
    tokio::fs::hard_link(partial.path(), path)
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => DownloadError::already_exists(path),
            _ => DownloadError::io(path, e),
        })?;
    partial.remove().await;

    Ok(bytes_written)
}

/// Temporary file that deletes itself unless removed explicitly.
struct PartialFile {
    path: PathBuf,
    armed: bool,
}

impl PartialFile {
    fn for_target(target: &Path) -> Self {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path: target.with_file_name(format!("{PARTIAL_FILE_PREFIX}{name}{PARTIAL_FILE_SUFFIX}")),
            armed: true,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn remove(mut self) {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => self.armed = false,
            Err(e) if e.kind() == ErrorKind::NotFound => self.armed = false,
            // Leave it armed; Drop retries.
            Err(_) => {}
        }
    }
}

impl Drop for PartialFile {
    // Blocking unlink on purpose: Drop cannot await, and this is one small
    // metadata operation on the error path.
    fn drop(&mut self) {
        if self.armed
            && let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != ErrorKind::NotFound
        {
            debug!(path = %self.path.display(), error = %e, "failed to remove partial file");
        }
    }
}
