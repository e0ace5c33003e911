//! Order status state machine service.
//!
//! `set_status` is the only write path for order status: it validates the
//! transition against the table in [`maru_core::OrderStatus`], appends
//! exactly one history entry per accepted transition, and is the sole
//! trigger of notification dispatch.
//!
//! Calls are serialized per order through a lock map, so no two
//! transitions for the same order can both be accepted without one
//! observing the other's mutation id. Replaying an already-applied
//! mutation id is a no-op success, not an error.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{info, instrument, warn};
use uuid::Uuid;

use maru_core::{
    Actor, DispatchResult, NotificationPreferences, Order, OrderId, OrderStatus,
    OrderStatusHistoryEntry,
};

use crate::error::OrdersError;
use crate::services::dispatch::NotificationDispatcher;
use crate::store::{OrderStore, PreferenceStore};

/// Outcome of a `set_status` call.
#[derive(Debug)]
pub struct StatusChange {
    /// The order after the call.
    pub order: Order,
    /// `true` when the mutation id was already applied and nothing changed.
    pub replayed: bool,
    /// Dispatch outcome for the transition; `None` on replay.
    pub dispatch: Option<DispatchResult>,
}

/// Applies order status transitions.
pub struct OrderStatusService {
    orders: Arc<dyn OrderStore>,
    preferences: Arc<dyn PreferenceStore>,
    dispatcher: Arc<NotificationDispatcher>,
    locks: Mutex<HashMap<OrderId, Arc<tokio::sync::Mutex<()>>>>,
}

impl OrderStatusService {
    /// Create the service.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderStore>,
        preferences: Arc<dyn PreferenceStore>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            orders,
            preferences,
            dispatcher,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Apply a status transition to an order.
    ///
    /// Idempotent on `mutation_id`: a replay returns the current order
    /// with `replayed: true`, creating no duplicate history entry and no
    /// duplicate dispatch. Notification failures are reported only
    /// through `StatusChange::dispatch` warnings and never fail the
    /// transition.
    ///
    /// # Errors
    ///
    /// - [`OrdersError::OrderNotFound`] if the order does not exist.
    /// - [`OrdersError::InvalidTransition`] if the target status is not
    ///   reachable; the order and its history are left untouched.
    /// - [`OrdersError::Repository`] if storage fails.
    #[instrument(skip(self, note), fields(order_id = %order_id, next = %next, actor = %actor))]
    pub async fn set_status(
        &self,
        order_id: &OrderId,
        next: OrderStatus,
        note: Option<String>,
        actor: Actor,
        mutation_id: Uuid,
    ) -> Result<StatusChange, OrdersError> {
        let lock = self.order_lock(order_id);
        let _guard = lock.lock().await;

        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or_else(|| OrdersError::OrderNotFound(order_id.clone()))?;

        if Self::already_applied(&order, next, mutation_id) {
            info!(%mutation_id, "mutation already applied, replay is a no-op");
            return Ok(StatusChange {
                order,
                replayed: true,
                dispatch: None,
            });
        }

        if !order.status.is_valid_transition(next) {
            return Err(OrdersError::InvalidTransition {
                from: order.status,
                to: next,
            });
        }

        let entry = OrderStatusHistoryEntry::new(next, note, actor, mutation_id);
        let order = self.orders.append_history(order_id, entry.clone()).await?;
        info!(status = %next, "order status updated");

        let prefs = self.load_preferences(&order).await;
        let dispatch = self
            .dispatcher
            .dispatch(&order, &entry, prefs.as_ref())
            .await;

        Ok(StatusChange {
            order,
            replayed: false,
            dispatch: Some(dispatch),
        })
    }

    /// Whether this mutation id was already applied: it is the
    /// last-applied one, or the order already sits in the target state
    /// with the same id somewhere in its history.
    fn already_applied(order: &Order, next: OrderStatus, mutation_id: Uuid) -> bool {
        if order.last_mutation_id == Some(mutation_id) {
            return true;
        }
        order.status == next
            && order
                .history
                .iter()
                .any(|entry| entry.mutation_id == mutation_id)
    }

    /// Preference lookup failures degrade to "no preferences" - they must
    /// never fail the transition that already happened.
    async fn load_preferences(&self, order: &Order) -> Option<NotificationPreferences> {
        let user_id = order.customer_user_id.as_ref()?;
        match self.preferences.get(user_id).await {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!(error = %e, user_id = %user_id, "failed to load notification preferences");
                None
            }
        }
    }

    fn order_lock(&self, id: &OrderId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().expect("order lock map poisoned");
        locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}
