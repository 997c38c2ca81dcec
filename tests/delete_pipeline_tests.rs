use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use urlshort::errors::{Result, ShortenerError};
use urlshort::services::DeleteService;
use urlshort::storage::{DeleteRequest, ShortenedEntry, Storage};

/// Storage double that records every `mark_deleted` call it receives and can
/// be armed to fail the next one.
#[derive(Default)]
struct RecordingStorage {
    calls: Mutex<Vec<Vec<DeleteRequest>>>,
    fail_next: AtomicBool,
    not_supported: AtomicBool,
}

impl RecordingStorage {
    fn calls(&self) -> Vec<Vec<DeleteRequest>> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn resolve(&self, _short_id: &str) -> Option<ShortenedEntry> {
        None
    }

    async fn save(&self, _user_id: i32, _short_id: &str, _full_url: &str) -> Result<()> {
        Ok(())
    }

    async fn save_batch(&self, _user_id: i32, _entries: &HashMap<String, String>) -> Result<()> {
        Ok(())
    }

    async fn lookup_short_id(&self, full_url: &str) -> Result<String> {
        Err(ShortenerError::not_found(full_url))
    }

    async fn list_by_owner(&self, _user_id: i32) -> Result<HashMap<String, String>> {
        Ok(HashMap::new())
    }

    async fn allocate_user_id(&self) -> Result<i32> {
        Ok(1)
    }

    async fn mark_deleted(&self, requests: &[DeleteRequest]) -> Result<()> {
        if self.not_supported.load(Ordering::SeqCst) {
            return Err(ShortenerError::not_supported(
                "deletion is not supported by this backend",
            ));
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ShortenerError::database_operation("simulated outage"));
        }
        self.calls.lock().push(requests.to_vec());
        Ok(())
    }

    async fn check_liveness(&self) -> Result<()> {
        Ok(())
    }

    async fn shutdown(&self) {}
}

fn request(user_id: i32, short_id: &str) -> DeleteRequest {
    DeleteRequest {
        user_id,
        short_id: short_id.to_string(),
    }
}

#[cfg(test)]
mod fan_in_tests {
    use super::*;

    #[tokio::test]
    async fn test_concurrent_submissions_merge_into_one_backend_call() {
        let storage = Arc::new(RecordingStorage::default());
        let service = DeleteService::new(storage.clone(), Duration::from_secs(3600));

        let first: Vec<DeleteRequest> = (0..5).map(|i| request(1, &format!("aaaa{i:04}"))).collect();
        let second: Vec<DeleteRequest> = Vec::new();
        let third: Vec<DeleteRequest> = (0..7).map(|i| request(2, &format!("bbbb{i:04}"))).collect();

        service.submit(first.clone());
        service.submit(second);
        service.submit(third.clone());
        assert_eq!(service.pending(), 12);

        service.flush().await;

        let calls = storage.calls();
        assert_eq!(calls.len(), 1, "all batches must merge into one call");
        assert_eq!(calls[0].len(), 12);
        for req in first.iter().chain(third.iter()) {
            assert!(calls[0].contains(req));
        }
        assert_eq!(service.pending(), 0);
    }

    #[tokio::test]
    async fn test_intra_batch_order_is_preserved() {
        let storage = Arc::new(RecordingStorage::default());
        let service = DeleteService::new(storage.clone(), Duration::from_secs(3600));

        let batch: Vec<DeleteRequest> = (0..4).map(|i| request(7, &format!("cccc{i:04}"))).collect();
        service.submit(batch.clone());
        service.flush().await;

        assert_eq!(storage.calls()[0], batch);
    }

    #[tokio::test]
    async fn test_flush_with_empty_buffer_skips_backend() {
        let storage = Arc::new(RecordingStorage::default());
        let service = DeleteService::new(storage.clone(), Duration::from_secs(3600));

        service.flush().await;
        assert!(storage.calls().is_empty());
    }

    #[tokio::test]
    async fn test_submissions_from_many_tasks_all_arrive() {
        let storage = Arc::new(RecordingStorage::default());
        let service = Arc::new(DeleteService::new(storage.clone(), Duration::from_secs(3600)));

        let mut handles = Vec::new();
        for task in 0..8 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service.submit(vec![request(task, &format!("dddd{task:04}"))]);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        service.flush().await;

        let calls = storage.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 8);
    }
}

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_failed_flush_requeues_for_next_tick() {
        let storage = Arc::new(RecordingStorage::default());
        storage.fail_next.store(true, Ordering::SeqCst);

        let service = DeleteService::new(storage.clone(), Duration::from_secs(3600));
        service.submit(vec![request(1, "aaaa0000"), request(1, "aaaa0001")]);

        service.flush().await;
        assert!(storage.calls().is_empty());
        assert_eq!(service.pending(), 2, "failed batch must stay buffered");

        service.flush().await;
        let calls = storage.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 2);
        assert_eq!(service.pending(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_backend_drops_batch_without_retry() {
        let storage = Arc::new(RecordingStorage::default());
        storage.not_supported.store(true, Ordering::SeqCst);

        let service = DeleteService::new(storage.clone(), Duration::from_secs(3600));
        service.submit(vec![request(1, "aaaa0000")]);

        service.flush().await;
        assert!(storage.calls().is_empty());
        assert_eq!(service.pending(), 0, "retrying can never succeed, drop it");
    }
}
