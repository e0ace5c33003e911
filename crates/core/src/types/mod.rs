//! Core types for Maru.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod dispatch;
pub mod event;
pub mod id;
pub mod order;
pub mod preferences;
pub mod price;
pub mod status;
pub mod template;

pub use dispatch::DispatchResult;
pub use event::NotificationEvent;
pub use id::*;
pub use order::{
    CreateOrderRequest, CustomerContact, DeliveryAddress, ItemOption, Order, OrderItem,
    OrderTotals, PaymentDescriptor, RetryQueueEntry, UnmaskedContact,
};
pub use preferences::{
    Channel, ChannelRecipients, DEFAULT_LOCALE, NotificationPreferences, QuietHours,
};
pub use price::{CurrencyCode, Price};
pub use status::{Actor, OrderStatus, OrderStatusHistoryEntry};
pub use template::{NotificationTemplate, RenderedMessage, TemplateChannel, TemplateStatus};
