//! Dispatch attempt log.
//!
//! Every dispatch attempt that is not fully successful is recorded with
//! enough detail (channel, error code, order id, timestamp) for the
//! operator dashboard to support manual retry. Queued entries carry the
//! `scheduled_for` instant the external redelivery scheduler must honor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use maru_core::{Channel, NotificationEvent, Order, OrderId, StoreId};

/// Why an attempt landed in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Channel send failed.
    Failed { code: String, message: String },
    /// Deferred for quiet hours; redeliver no earlier than `scheduled_for`.
    Queued { scheduled_for: DateTime<Utc> },
}

/// One record in the dispatch attempt log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchLogEntry {
    pub id: Uuid,
    pub order_id: OrderId,
    pub store_id: StoreId,
    pub channel: Channel,
    pub event: NotificationEvent,
    pub outcome: DispatchOutcome,
    pub created_at: DateTime<Utc>,
}

impl DispatchLogEntry {
    /// Header row matching [`Self::csv_row`], for the operator CSV export.
    pub const CSV_HEADER: &'static str = "created_at,order_id,store_id,channel,event,kind,detail";

    /// Record a failed channel send.
    #[must_use]
    pub fn failed(
        order: &Order,
        channel: Channel,
        event: NotificationEvent,
        code: impl Into<String>,
        message: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id: order.id.clone(),
            store_id: order.store_id.clone(),
            channel,
            event,
            outcome: DispatchOutcome::Failed {
                code: code.into(),
                message: message.into(),
            },
            created_at: at,
        }
    }

    /// Record a quiet-hours deferral.
    #[must_use]
    pub fn queued(
        order: &Order,
        channel: Channel,
        event: NotificationEvent,
        scheduled_for: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id: order.id.clone(),
            store_id: order.store_id.clone(),
            channel,
            event,
            outcome: DispatchOutcome::Queued { scheduled_for },
            created_at: at,
        }
    }

    /// One CSV row for the operator export.
    #[must_use]
    pub fn csv_row(&self) -> String {
        let (kind, detail) = match &self.outcome {
            DispatchOutcome::Failed { code, message } => {
                ("failed", format!("{code}: {message}"))
            }
            DispatchOutcome::Queued { scheduled_for } => {
                ("queued", scheduled_for.to_rfc3339())
            }
        };
        format!(
            "{},{},{},{},{},{},{}",
            self.created_at.to_rfc3339(),
            csv_field(self.order_id.as_str()),
            csv_field(self.store_id.as_str()),
            self.channel,
            self.event,
            kind,
            csv_field(&detail),
        )
    }
}

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
