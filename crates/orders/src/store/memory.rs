//! In-memory store implementations.
//!
//! Stand-ins for the abstract document store, used by tests and local
//! development. Each write holds its lock only for the duration of the
//! mutation; `append_history` performs the history append, status cache
//! update, and mutation-id update as one atomic write, matching the
//! document-transaction contract of the real store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use maru_core::{
    NotificationPreferences, NotificationTemplate, Order, OrderId, OrderStatusHistoryEntry,
    RetryQueueEntry, TemplateChannel, UserId,
};

use super::{
    DispatchLogStore, OperationalSettings, OrderStore, PreferenceStore, RepositoryError,
    RetryQueueStore, TemplateStore,
};
use crate::notify::log::DispatchLogEntry;

/// In-memory order document store.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn insert(&self, order: Order) -> Result<(), RepositoryError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(RepositoryError::Conflict(format!(
                "order {} already exists",
                order.id
            )));
        }
        orders.insert(order.id.clone(), order);
        Ok(())
    }

    async fn append_history(
        &self,
        id: &OrderId,
        entry: OrderStatusHistoryEntry,
    ) -> Result<Order, RepositoryError> {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(id).ok_or(RepositoryError::NotFound)?;
        order.status = entry.status;
        order.last_mutation_id = Some(entry.mutation_id);
        order.updated_at = entry.created_at;
        order.history.push(entry);
        Ok(order.clone())
    }

    async fn history(
        &self,
        id: &OrderId,
    ) -> Result<Vec<OrderStatusHistoryEntry>, RepositoryError> {
        let orders = self.orders.read().await;
        let order = orders.get(id).ok_or(RepositoryError::NotFound)?;
        Ok(order.history.clone())
    }
}

/// In-memory preference store.
#[derive(Default)]
pub struct InMemoryPreferenceStore {
    preferences: RwLock<HashMap<UserId, NotificationPreferences>>,
}

impl InMemoryPreferenceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a user's preferences (the owning user's write path).
    pub async fn put(&self, user_id: UserId, preferences: NotificationPreferences) {
        self.preferences.write().await.insert(user_id, preferences);
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn get(
        &self,
        user_id: &UserId,
    ) -> Result<Option<NotificationPreferences>, RepositoryError> {
        Ok(self.preferences.read().await.get(user_id).cloned())
    }
}

/// In-memory template store, keyed by `(name, channel)`.
#[derive(Default)]
pub struct InMemoryTemplateStore {
    templates: RwLock<HashMap<(String, TemplateChannel), NotificationTemplate>>,
}

impl InMemoryTemplateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn find(
        &self,
        name: &str,
        channel: TemplateChannel,
    ) -> Result<Option<NotificationTemplate>, RepositoryError> {
        Ok(self
            .templates
            .read()
            .await
            .get(&(name.to_string(), channel))
            .cloned())
    }

    async fn upsert(&self, template: NotificationTemplate) -> Result<(), RepositoryError> {
        self.templates
            .write()
            .await
            .insert((template.name.clone(), template.channel), template);
        Ok(())
    }
}

/// In-memory operational settings.
#[derive(Default)]
pub struct InMemoryOperationalSettings {
    paused: AtomicBool,
}

impl InMemoryOperationalSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OperationalSettings for InMemoryOperationalSettings {
    async fn notifications_paused(&self) -> Result<bool, RepositoryError> {
        Ok(self.paused.load(Ordering::SeqCst))
    }

    async fn set_notifications_paused(&self, paused: bool) -> Result<(), RepositoryError> {
        self.paused.store(paused, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory dispatch attempt log.
#[derive(Default)]
pub struct InMemoryDispatchLog {
    entries: RwLock<Vec<DispatchLogEntry>>,
}

impl InMemoryDispatchLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded entries, oldest first.
    pub async fn all(&self) -> Vec<DispatchLogEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl DispatchLogStore for InMemoryDispatchLog {
    async fn append(&self, entry: DispatchLogEntry) -> Result<(), RepositoryError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn entries_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<DispatchLogEntry>, RepositoryError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| &e.order_id == order_id)
            .cloned()
            .collect())
    }
}

/// In-memory retry queue store.
#[derive(Default)]
pub struct InMemoryRetryQueueStore {
    entries: RwLock<Vec<RetryQueueEntry>>,
}

impl InMemoryRetryQueueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RetryQueueStore for InMemoryRetryQueueStore {
    async fn append(&self, entry: RetryQueueEntry) -> Result<(), RepositoryError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn load(&self) -> Result<Vec<RetryQueueEntry>, RepositoryError> {
        Ok(self.entries.read().await.clone())
    }

    async fn update(&self, entry: &RetryQueueEntry) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        if let Some(existing) = entries.iter_mut().find(|e| e.id == entry.id) {
            *existing = entry.clone();
        }
        Ok(())
    }

    async fn remove(&self, ids: &[Uuid]) -> Result<(), RepositoryError> {
        self.entries.write().await.retain(|e| !ids.contains(&e.id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use maru_core::{
        Actor, CurrencyCode, CustomerContact, OrderStatus, PaymentDescriptor, StoreId,
    };
    use rust_decimal::Decimal;

    use super::*;

    fn sample_order(id: &str) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new(id),
            store_id: StoreId::new("store-1"),
            store_name: "Maru Kitchen".to_string(),
            order_number: "A-1001".to_string(),
            items: Vec::new(),
            status: OrderStatus::New,
            contact: CustomerContact::from_unmasked("김민수", "010-1234-5678"),
            delivery_address: None,
            payment: PaymentDescriptor::DISABLED,
            delivery_fee: Decimal::ZERO,
            currency: CurrencyCode::KRW,
            customer_user_id: None,
            history: Vec::new(),
            last_mutation_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let store = InMemoryOrderStore::new();
        store.insert(sample_order("o-1")).await.expect("insert");

        let result = store.insert(sample_order("o-1")).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_append_history_updates_cache_fields() {
        let store = InMemoryOrderStore::new();
        store.insert(sample_order("o-2")).await.expect("insert");

        let mutation_id = Uuid::new_v4();
        let entry = OrderStatusHistoryEntry::new(
            OrderStatus::Confirmed,
            None,
            Actor::System,
            mutation_id,
        );
        let updated = store
            .append_history(&OrderId::new("o-2"), entry)
            .await
            .expect("append");

        assert_eq!(updated.status, OrderStatus::Confirmed);
        assert_eq!(updated.last_mutation_id, Some(mutation_id));
        assert_eq!(updated.history.len(), 1);
    }

    #[tokio::test]
    async fn test_retry_store_update_and_remove() {
        use maru_core::CreateOrderRequest;

        let store = InMemoryRetryQueueStore::new();
        let mut entry = RetryQueueEntry::new(CreateOrderRequest {
            store_id: StoreId::new("store-1"),
            items: Vec::new(),
            customer_name: "김민수".to_string(),
            customer_phone: "010-1234-5678".to_string(),
            delivery_address: None,
            note: None,
        });
        store.append(entry.clone()).await.expect("append");

        entry.retry_count = 3;
        store.update(&entry).await.expect("update");
        let loaded = store.load().await.expect("load");
        assert_eq!(loaded.first().map(|e| e.retry_count), Some(3));

        store.remove(&[entry.id]).await.expect("remove");
        assert!(store.load().await.expect("load").is_empty());
    }
}
