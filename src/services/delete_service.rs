//! Deletion pipeline
//!
//! Delete requests from many concurrent HTTP calls are buffered and flushed
//! to storage in one bulk `mark_deleted` call on a fixed cadence, so the
//! request path never waits on a backend write. `submit` is a non-blocking
//! O(1) append under a mutex; the flush swaps the buffer out under the same
//! lock and releases it before touching the backend.
//!
//! A failed flush is logged and its batch re-queued for the next tick, except
//! for backends that report deletion as unsupported, where retrying can never
//! succeed and the batch is dropped with a warning.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, error, warn};

use crate::storage::{DeleteRequest, Storage};

/// Cadence of the background flush.
pub const DELETE_FLUSH_PERIOD: Duration = Duration::from_secs(10);

pub struct DeleteService {
    storage: Arc<dyn Storage>,
    flush_interval: Duration,
    /// Batches submitted since the last flush. Intra-batch order is
    /// preserved; inter-batch order is unspecified.
    buffer: Mutex<Vec<Vec<DeleteRequest>>>,
}

impl DeleteService {
    pub fn new(storage: Arc<dyn Storage>, flush_interval: Duration) -> Self {
        Self {
            storage,
            flush_interval,
            buffer: Mutex::new(Vec::new()),
        }
    }

    /// Hand a finite batch of delete requests to the pipeline.
    ///
    /// Returns immediately; the batch is persisted by a later flush. Requests
    /// still buffered at shutdown are lost.
    pub fn submit(&self, requests: Vec<DeleteRequest>) {
        if requests.is_empty() {
            return;
        }
        self.buffer.lock().push(requests);
    }

    /// Run the timer-driven flush loop until `shutdown` flips to true.
    ///
    /// On shutdown the loop exits without a final flush; at-most-once
    /// delivery per flush window is the contract.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.flush_interval);
        // The first tick of a tokio interval fires immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.flush().await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        debug!("delete service stopping, abandoning buffered requests");
                        return;
                    }
                }
            }
        }
    }

    /// Merge all pending batches and issue one bulk soft-delete.
    pub async fn flush(&self) {
        let pending = {
            let mut buffer = self.buffer.lock();
            std::mem::take(&mut *buffer)
        };
        // The lock is released; the backend call below must not hold it.

        let batch: Vec<DeleteRequest> = pending.into_iter().flatten().collect();
        if batch.is_empty() {
            return;
        }

        debug!("flushing {} delete requests", batch.len());
        if let Err(e) = self.storage.mark_deleted(&batch).await {
            if e.is_not_supported() {
                warn!(
                    "dropping {} delete requests: {}",
                    batch.len(),
                    e
                );
            } else {
                error!("delete flush failed, re-queueing {} requests: {}", batch.len(), e);
                self.buffer.lock().push(batch);
            }
        }
    }

    /// Number of requests waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.buffer.lock().iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;

    fn request(user_id: i32, short_id: &str) -> DeleteRequest {
        DeleteRequest {
            user_id,
            short_id: short_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_submit_is_buffered_until_flush() {
        let storage = Arc::new(MemoryStorage::new());
        storage.save(1, "aaaa0000", "http://example.com/a").await.unwrap();

        let service = DeleteService::new(storage.clone(), DELETE_FLUSH_PERIOD);
        service.submit(vec![request(1, "aaaa0000")]);

        assert_eq!(service.pending(), 1);
        assert!(!storage.resolve("aaaa0000").await.unwrap().is_deleted);

        service.flush().await;
        assert_eq!(service.pending(), 0);
        assert!(storage.resolve("aaaa0000").await.unwrap().is_deleted);
    }

    #[tokio::test]
    async fn test_empty_submit_ignored() {
        let storage = Arc::new(MemoryStorage::new());
        let service = DeleteService::new(storage, DELETE_FLUSH_PERIOD);
        service.submit(Vec::new());
        assert_eq!(service.pending(), 0);
    }

    #[tokio::test]
    async fn test_owner_mismatch_survives_flush() {
        let storage = Arc::new(MemoryStorage::new());
        storage.save(1, "aaaa0000", "http://example.com/a").await.unwrap();

        let service = DeleteService::new(storage.clone(), DELETE_FLUSH_PERIOD);
        service.submit(vec![request(2, "aaaa0000")]);
        service.flush().await;

        assert!(!storage.resolve("aaaa0000").await.unwrap().is_deleted);
    }

    #[tokio::test]
    async fn test_background_task_flushes_on_timer() {
        let storage = Arc::new(MemoryStorage::new());
        storage.save(1, "aaaa0000", "http://example.com/a").await.unwrap();

        let service = Arc::new(DeleteService::new(
            storage.clone(),
            Duration::from_millis(20),
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let runner = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.run(shutdown_rx).await })
        };

        service.submit(vec![request(1, "aaaa0000")]);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(storage.resolve("aaaa0000").await.unwrap().is_deleted);

        shutdown_tx.send(true).unwrap();
        runner.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_abandons_buffered_requests() {
        let storage = Arc::new(MemoryStorage::new());
        storage.save(1, "aaaa0000", "http://example.com/a").await.unwrap();

        let service = Arc::new(DeleteService::new(storage.clone(), Duration::from_secs(3600)));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let runner = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.run(shutdown_rx).await })
        };

        service.submit(vec![request(1, "aaaa0000")]);
        shutdown_tx.send(true).unwrap();
        runner.await.unwrap();

        // No final flush on shutdown.
        assert!(!storage.resolve("aaaa0000").await.unwrap().is_deleted);
        assert_eq!(service.pending(), 1);
    }
}
