//! Unified error handling for order services.
//!
//! State-machine errors are fatal to the calling operation. Errors on the
//! notification path never appear here: the dispatcher absorbs them into
//! `DispatchResult::warnings`.

use thiserror::Error;

use maru_core::{OrderId, OrderStatus};

use crate::store::RepositoryError;

/// Service-level error type for order operations.
#[derive(Debug, Error)]
pub enum OrdersError {
    /// Requested status is not reachable from the current status.
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Order does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// Storage operation failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_display() {
        let err = OrdersError::InvalidTransition {
            from: OrderStatus::Ready,
            to: OrderStatus::Cancelled,
        };
        assert_eq!(err.to_string(), "invalid transition: READY -> CANCELLED");
    }

    #[test]
    fn test_order_not_found_display() {
        let err = OrdersError::OrderNotFound(OrderId::new("order-123"));
        assert_eq!(err.to_string(), "order not found: order-123");
    }
}
