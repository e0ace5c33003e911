//! Offline retry queue for order creation.
//!
//! When the checkout flow cannot reach the backend, the creation request
//! is parked in a durable local queue. `drain` replays queued requests
//! opportunistically (e.g., on reconnect) with a bounded retry count; an
//! exhausted entry is dropped loudly, since it represents a lost customer
//! order if unnoticed.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, instrument, warn};

use maru_core::{CreateOrderRequest, OrderId, RetryQueueEntry};

use crate::store::{RepositoryError, RetryQueueStore};

/// Maximum delivery attempts per queued request.
pub const MAX_ATTEMPTS: u32 = 5;

/// Errors returned by an [`OrderSubmitter`].
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The backend was unreachable.
    #[error("network error: {0}")]
    Network(String),

    /// The backend rejected the request.
    #[error("rejected: {0}")]
    Rejected(String),
}

/// The order-creation backend, as seen from the retry queue.
#[async_trait]
pub trait OrderSubmitter: Send + Sync {
    /// Attempt to create the order, returning its assigned id.
    async fn submit(&self, request: &CreateOrderRequest) -> Result<OrderId, SubmitError>;
}

/// Summary of one drain pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Entries successfully submitted and removed.
    pub submitted: u32,
    /// Entries that failed and remain queued.
    pub retried: u32,
    /// Entries dropped after exhausting their retry budget.
    pub dropped: u32,
}

/// Durable local queue of failed order-creation requests.
pub struct RetryQueue {
    store: Arc<dyn RetryQueueStore>,
}

impl RetryQueue {
    /// Create a queue over a store.
    #[must_use]
    pub fn new(store: Arc<dyn RetryQueueStore>) -> Self {
        Self { store }
    }

    /// Park a creation request for later replay.
    ///
    /// # Errors
    ///
    /// Returns error if the store write fails.
    #[instrument(skip(self, request), fields(store_id = %request.store_id))]
    pub async fn enqueue(&self, request: CreateOrderRequest) -> Result<(), RepositoryError> {
        let entry = RetryQueueEntry::new(request);
        info!(entry_id = %entry.id, "order creation queued for retry");
        self.store.append(entry).await
    }

    /// Replay queued requests once each.
    ///
    /// Operates on a snapshot of the queue (copy-then-filter), so entries
    /// enqueued while a drain is in flight are untouched until the next
    /// pass. A crash mid-drain leaves a valid subset in storage.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails; submit failures are counted,
    /// not returned.
    #[instrument(skip(self, submitter))]
    pub async fn drain(&self, submitter: &dyn OrderSubmitter) -> Result<DrainReport, RepositoryError> {
        let snapshot = self.store.load().await?;
        let mut report = DrainReport::default();

        for mut entry in snapshot {
            match submitter.submit(&entry.request).await {
                Ok(order_id) => {
                    info!(entry_id = %entry.id, order_id = %order_id, "queued order created");
                    self.store.remove(&[entry.id]).await?;
                    report.submitted += 1;
                }
                Err(e) => {
                    entry.retry_count += 1;
                    if entry.retry_count >= MAX_ATTEMPTS {
                        warn!(
                            entry_id = %entry.id,
                            retry_count = entry.retry_count,
                            error = %e,
                            "retry budget exhausted, dropping queued order"
                        );
                        self.store.remove(&[entry.id]).await?;
                        report.dropped += 1;
                    } else {
                        self.store.update(&entry).await?;
                        report.retried += 1;
                    }
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use maru_core::StoreId;

    use super::*;
    use crate::store::memory::InMemoryRetryQueueStore;

    struct AlwaysFails;

    #[async_trait]
    impl OrderSubmitter for AlwaysFails {
        async fn submit(&self, _request: &CreateOrderRequest) -> Result<OrderId, SubmitError> {
            Err(SubmitError::Network("offline".to_string()))
        }
    }

    struct SucceedsAfter {
        failures: AtomicU32,
    }

    #[async_trait]
    impl OrderSubmitter for SucceedsAfter {
        async fn submit(&self, _request: &CreateOrderRequest) -> Result<OrderId, SubmitError> {
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining == 0 {
                Ok(OrderId::new("o-created"))
            } else {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                Err(SubmitError::Network("offline".to_string()))
            }
        }
    }

    fn request() -> CreateOrderRequest {
        CreateOrderRequest {
            store_id: StoreId::new("store-1"),
            items: Vec::new(),
            customer_name: "김민수".to_string(),
            customer_phone: "010-1234-5678".to_string(),
            delivery_address: None,
            note: None,
        }
    }

    #[tokio::test]
    async fn test_entry_removed_on_fifth_failure() {
        let store = Arc::new(InMemoryRetryQueueStore::new());
        let queue = RetryQueue::new(store.clone());
        queue.enqueue(request()).await.expect("enqueue");

        for pass in 1..=4_u32 {
            let report = queue.drain(&AlwaysFails).await.expect("drain");
            assert_eq!(report.retried, 1, "pass {pass} should retain the entry");
            let entries = store.load().await.expect("load");
            assert_eq!(entries.first().map(|e| e.retry_count), Some(pass));
        }

        // Fifth failure drops the entry rather than retaining it.
        let report = queue.drain(&AlwaysFails).await.expect("drain");
        assert_eq!(report.dropped, 1);
        assert!(store.load().await.expect("load").is_empty());

        // Nothing left for a sixth attempt.
        let report = queue.drain(&AlwaysFails).await.expect("drain");
        assert_eq!(report, DrainReport::default());
    }

    #[tokio::test]
    async fn test_success_removes_entry() {
        let store = Arc::new(InMemoryRetryQueueStore::new());
        let queue = RetryQueue::new(store.clone());
        queue.enqueue(request()).await.expect("enqueue");

        let submitter = SucceedsAfter {
            failures: AtomicU32::new(0),
        };
        let report = queue.drain(&submitter).await.expect("drain");
        assert_eq!(report.submitted, 1);
        assert!(store.load().await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn test_entry_recovers_before_budget() {
        let store = Arc::new(InMemoryRetryQueueStore::new());
        let queue = RetryQueue::new(store.clone());
        queue.enqueue(request()).await.expect("enqueue");

        let submitter = SucceedsAfter {
            failures: AtomicU32::new(2),
        };
        assert_eq!(queue.drain(&submitter).await.expect("drain").retried, 1);
        assert_eq!(queue.drain(&submitter).await.expect("drain").retried, 1);
        assert_eq!(queue.drain(&submitter).await.expect("drain").submitted, 1);
        assert!(store.load().await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn test_drain_skips_entries_enqueued_mid_pass() {
        // Snapshot semantics: an entry appended after the snapshot is
        // loaded must survive the pass untouched.
        let store = Arc::new(InMemoryRetryQueueStore::new());
        let queue = RetryQueue::new(store.clone());
        queue.enqueue(request()).await.expect("enqueue");

        let report = queue.drain(&AlwaysFails).await.expect("drain");
        assert_eq!(report.retried, 1);

        queue.enqueue(request()).await.expect("enqueue");
        let entries = store.load().await.expect("load");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.last().map(|e| e.retry_count), Some(0));
    }
}
