//! Order status state machine.
//!
//! Statuses form a small finite state machine: the transition table lives
//! in [`OrderStatus::next_statuses`] as an exhaustive `match`, so adding a
//! status without deciding its transitions is a compile error rather than
//! a silent fall-through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::UserId;

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    New,
    Confirmed,
    Preparing,
    Ready,
    Fulfilled,
    Cancelled,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::New,
        Self::Confirmed,
        Self::Preparing,
        Self::Ready,
        Self::Fulfilled,
        Self::Cancelled,
    ];

    /// Statuses reachable from this one.
    #[must_use]
    pub const fn next_statuses(self) -> &'static [Self] {
        match self {
            Self::New => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed => &[Self::Preparing, Self::Cancelled],
            Self::Preparing => &[Self::Ready, Self::Cancelled],
            Self::Ready => &[Self::Fulfilled],
            Self::Fulfilled | Self::Cancelled => &[],
        }
    }

    /// Whether `next` is reachable from this status in one step.
    #[must_use]
    pub fn is_valid_transition(self, next: Self) -> bool {
        self.next_statuses().contains(&next)
    }

    /// Terminal statuses admit no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Fulfilled | Self::Cancelled)
    }

    /// An order can be modified iff its status is not terminal.
    #[must_use]
    pub const fn can_modify(self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::New => "NEW",
            Self::Confirmed => "CONFIRMED",
            Self::Preparing => "PREPARING",
            Self::Ready => "READY",
            Self::Fulfilled => "FULFILLED",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "CONFIRMED" => Ok(Self::Confirmed),
            "PREPARING" => Ok(Self::Preparing),
            "READY" => Ok(Self::Ready),
            "FULFILLED" => Ok(Self::Fulfilled),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Who performed a status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    /// A signed-in user.
    User(UserId),
    /// Automated transition.
    System,
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User(id) => write!(f, "{id}"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Immutable, append-only record of one accepted status transition.
///
/// History is the source of truth for an order's status: the most recent
/// entry by `created_at` is the current status, and the denormalized
/// `Order::status` is a cache of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusHistoryEntry {
    /// Status the order transitioned to.
    pub status: OrderStatus,
    /// Optional operator note.
    pub note: Option<String>,
    /// When the transition was accepted.
    pub created_at: DateTime<Utc>,
    /// Who requested the transition.
    pub actor: Actor,
    /// Caller-supplied idempotency token for the transition.
    pub mutation_id: Uuid,
}

impl OrderStatusHistoryEntry {
    /// Create an entry timestamped now.
    #[must_use]
    pub fn new(status: OrderStatus, note: Option<String>, actor: Actor, mutation_id: Uuid) -> Self {
        Self {
            status,
            note,
            created_at: Utc::now(),
            actor,
            mutation_id,
        }
    }
}
