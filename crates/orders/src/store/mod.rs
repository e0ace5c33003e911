//! Storage interfaces for the order core.
//!
//! The services depend only on these traits; the backing technology is an
//! abstract document store (one document per order with an embedded
//! history list). This crate ships in-memory implementations in
//! [`memory`] and a JSON-file retry queue in [`file`].

pub mod file;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use maru_core::{
    NotificationPreferences, NotificationTemplate, Order, OrderId, OrderStatusHistoryEntry,
    RetryQueueEntry, TemplateChannel, UserId,
};

use crate::notify::log::DispatchLogEntry;

pub use file::JsonRetryQueueStore;
pub use memory::{
    InMemoryDispatchLog, InMemoryOperationalSettings, InMemoryOrderStore,
    InMemoryPreferenceStore, InMemoryRetryQueueStore, InMemoryTemplateStore,
};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying storage failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// File I/O failed (retry queue).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Data in the store is corrupted or invalid.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate order id).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Document store for orders and their status history.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetch an order by id.
    async fn get(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Insert a new order document.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] if the id already exists.
    async fn insert(&self, order: Order) -> Result<(), RepositoryError>;

    /// Append a history entry, updating the denormalized status and the
    /// last-applied mutation id in the same write. Returns the updated
    /// order.
    async fn append_history(
        &self,
        id: &OrderId,
        entry: OrderStatusHistoryEntry,
    ) -> Result<Order, RepositoryError>;

    /// Full status history for an order, oldest first.
    async fn history(&self, id: &OrderId)
    -> Result<Vec<OrderStatusHistoryEntry>, RepositoryError>;
}

/// Per-user notification preferences, read-only from dispatch.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, user_id: &UserId)
    -> Result<Option<NotificationPreferences>, RepositoryError>;
}

/// Notification template lookup.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Find a template by its unique name within a channel.
    async fn find(
        &self,
        name: &str,
        channel: TemplateChannel,
    ) -> Result<Option<NotificationTemplate>, RepositoryError>;

    /// Create or replace a template.
    async fn upsert(&self, template: NotificationTemplate) -> Result<(), RepositoryError>;
}

/// Operational switches owned by the operations team.
#[async_trait]
pub trait OperationalSettings: Send + Sync {
    /// Global "notifications paused" switch.
    async fn notifications_paused(&self) -> Result<bool, RepositoryError>;

    /// Flip the global pause switch.
    async fn set_notifications_paused(&self, paused: bool) -> Result<(), RepositoryError>;
}

/// Append-only log of dispatch attempts that were not fully successful
/// (the operator-facing DLQ).
#[async_trait]
pub trait DispatchLogStore: Send + Sync {
    async fn append(&self, entry: DispatchLogEntry) -> Result<(), RepositoryError>;

    /// Entries recorded for one order, oldest first.
    async fn entries_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<DispatchLogEntry>, RepositoryError>;
}

/// Durable local queue of failed order-creation requests.
#[async_trait]
pub trait RetryQueueStore: Send + Sync {
    /// Append a new entry.
    async fn append(&self, entry: RetryQueueEntry) -> Result<(), RepositoryError>;

    /// Snapshot of all queued entries.
    async fn load(&self) -> Result<Vec<RetryQueueEntry>, RepositoryError>;

    /// Replace the stored entry with the same id, if still present.
    async fn update(&self, entry: &RetryQueueEntry) -> Result<(), RepositoryError>;

    /// Remove entries by id. Missing ids are ignored.
    async fn remove(&self, ids: &[Uuid]) -> Result<(), RepositoryError>;
}
