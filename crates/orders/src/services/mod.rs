//! Order services.
//!
//! - [`status`] - the order status state machine
//! - [`dispatch`] - the notification dispatch pipeline
//! - [`retry`] - the offline retry queue for order creation

pub mod dispatch;
pub mod retry;
pub mod status;

pub use dispatch::NotificationDispatcher;
pub use retry::{DrainReport, OrderSubmitter, RetryQueue, SubmitError};
pub use status::{OrderStatusService, StatusChange};
