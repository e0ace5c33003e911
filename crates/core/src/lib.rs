//! Maru Core - Shared types library.
//!
//! This crate provides common types used across all Maru components:
//! - `orders` - Order lifecycle and notification dispatch services
//! - `integration-tests` - End-to-end scenario tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, the order model, the status state
//!   machine, notification preferences, templates, and dispatch results

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
