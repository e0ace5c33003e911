//! Notification events derived from order status changes.

use serde::{Deserialize, Serialize};

use super::status::OrderStatus;

/// Coarse-grained notification trigger derived from an order status.
///
/// The mapping is intentionally lossy: `PREPARING` and `READY` both
/// collapse to [`Self::OrderStatusChanged`]. Callers that need per-status
/// copy must carry the status alongside the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationEvent {
    #[serde(rename = "order.created")]
    OrderCreated,
    #[serde(rename = "order.confirmed")]
    OrderConfirmed,
    #[serde(rename = "order.status_changed")]
    OrderStatusChanged,
    #[serde(rename = "order.fulfilled")]
    OrderFulfilled,
    #[serde(rename = "order.cancelled")]
    OrderCancelled,
}

impl NotificationEvent {
    /// Map an order status to the event it triggers.
    #[must_use]
    pub const fn from_status(status: OrderStatus) -> Self {
        match status {
            OrderStatus::New => Self::OrderCreated,
            OrderStatus::Confirmed => Self::OrderConfirmed,
            OrderStatus::Preparing | OrderStatus::Ready => Self::OrderStatusChanged,
            OrderStatus::Fulfilled => Self::OrderFulfilled,
            OrderStatus::Cancelled => Self::OrderCancelled,
        }
    }

    /// Stable string key, used in preference maps and template names.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::OrderCreated => "order.created",
            Self::OrderConfirmed => "order.confirmed",
            Self::OrderStatusChanged => "order.status_changed",
            Self::OrderFulfilled => "order.fulfilled",
            Self::OrderCancelled => "order.cancelled",
        }
    }
}

impl std::fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}
