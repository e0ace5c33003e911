//! Maru Orders - order lifecycle and notification dispatch services.
//!
//! This crate is the core behind Maru's order screens: a status state
//! machine with per-order serialization and idempotent mutations, and a
//! notification pipeline that resolves user preferences, honors quiet
//! hours, renders templates, and fans out to channels with per-channel
//! failure isolation.
//!
//! # Architecture
//!
//! Storage and transports are behind narrow async traits ([`store`],
//! [`channel`]); the services in [`services`] depend only on those
//! traits. The crate ships in-memory store implementations (the
//! document-store stand-in used by tests and local development) and a
//! JSON-file retry queue for the offline order-creation path.
//!
//! # Failure semantics
//!
//! A status transition either fully succeeds or fails with
//! [`error::OrdersError::InvalidTransition`]. Everything downstream of an
//! accepted transition - preference lookup, template rendering, channel
//! sends - degrades gracefully: failures become warnings on the
//! [`maru_core::DispatchResult`], never errors to the caller.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod channel;
pub mod config;
pub mod error;
pub mod notify;
pub mod services;
pub mod store;

pub use config::{OrdersConfig, QuietHoursPolicy};
pub use error::OrdersError;
pub use services::dispatch::NotificationDispatcher;
pub use services::retry::{OrderSubmitter, RetryQueue, SubmitError};
pub use services::status::{OrderStatusService, StatusChange};
