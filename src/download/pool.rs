//! Connection slots shared by all workers of a run.
//!
//! The remote image server rejects clients that open too many parallel
//! connections, independently of how many logical tasks are running. A slot
//! must be held for the whole request and body transfer; workers that cannot
//! get one wait until another transfer finishes.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::trace;

use super::DownloadError;

/// Semaphore-backed cap on simultaneous outbound connections.
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    slots: Arc<Semaphore>,
    capacity: usize,
}

/// A held connection slot; released when dropped (RAII).
#[derive(Debug)]
pub struct ConnectionSlot {
    _permit: OwnedSemaphorePermit,
}

impl ConnectionPool {
    /// Creates a pool allowing `capacity` simultaneous connections.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Returns the configured number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of slots currently free.
    #[must_use]
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    /// Waits for a free slot.
    ///
    /// # Errors
    ///
    /// The semaphore is never closed, so a failure here means the run's
    /// state is broken; it is reported as [`DownloadError::TaskFailed`].
    pub async fn acquire(&self) -> Result<ConnectionSlot, DownloadError> {
        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|e| DownloadError::task_failed(e.to_string()))?;
        trace!(available = self.available(), "connection slot acquired");
        Ok(ConnectionSlot { _permit: permit })
    }
}
