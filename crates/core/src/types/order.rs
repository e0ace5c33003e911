//! The order model.
//!
//! Orders are created in `NEW` by the checkout flow, mutated only through
//! the status service, and never deleted - a terminal status
//! (`FULFILLED`/`CANCELLED`) ends the lifecycle. Display totals are always
//! recomputed from `items`; stored totals are never trusted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::{OrderId, StoreId, UserId};
use super::price::{CurrencyCode, Price};
use super::status::{OrderStatus, OrderStatusHistoryEntry};

/// VAT rate applied to the item subtotal (10%).
#[must_use]
pub fn tax_rate() -> Decimal {
    Decimal::new(1, 1)
}

/// A named option on an order item, with its price delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOption {
    pub name: String,
    pub price_delta: Decimal,
}

/// One line item on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub options: Vec<ItemOption>,
}

impl OrderItem {
    /// Line subtotal: (unit price + option deltas) × quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        let unit: Decimal = self.unit_price
            + self
                .options
                .iter()
                .map(|o| o.price_delta)
                .sum::<Decimal>();
        unit * Decimal::from(self.quantity)
    }
}

/// Unmasked customer contact details.
///
/// Deliberately not serializable: the unmasked form never leaves the
/// boundary that created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmaskedContact {
    pub name: String,
    pub phone: String,
}

/// Customer contact info as stored on an order.
///
/// Only the masked form is serialized; the unmasked form is kept
/// in-memory at the creating boundary and dropped on persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerContact {
    pub masked_name: String,
    pub masked_phone: String,
    #[serde(skip)]
    pub unmasked: Option<UnmaskedContact>,
}

impl CustomerContact {
    /// Build a contact from unmasked details, computing the masked forms.
    #[must_use]
    pub fn from_unmasked(name: &str, phone: &str) -> Self {
        Self {
            masked_name: mask_name(name),
            masked_phone: mask_phone(phone),
            unmasked: Some(UnmaskedContact {
                name: name.to_string(),
                phone: phone.to_string(),
            }),
        }
    }
}

/// Mask a personal name: keep the first and last characters, replace the
/// middle. Two-character names keep only the first; one character becomes `*`.
#[must_use]
pub fn mask_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    match chars.len() {
        0 => String::new(),
        1 => "*".to_string(),
        2 => chars
            .first()
            .map_or_else(String::new, |c| format!("{c}*")),
        n => {
            let mut masked = String::new();
            for (i, c) in chars.iter().enumerate() {
                if i == 0 || i == n - 1 {
                    masked.push(*c);
                } else {
                    masked.push('*');
                }
            }
            masked
        }
    }
}

/// Mask a phone number: keep the first three and last four digits,
/// masking digits in between. Separators are preserved.
#[must_use]
pub fn mask_phone(phone: &str) -> String {
    let digit_count = phone.chars().filter(char::is_ascii_digit).count();
    let mut seen = 0_usize;
    phone
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                seen += 1;
                if seen <= 3 || seen > digit_count.saturating_sub(4) {
                    c
                } else {
                    '*'
                }
            } else {
                c
            }
        })
        .collect()
}

/// Delivery address, when the order is for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

/// Payment descriptor. Billing is permanently off in this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDescriptor {
    pub enabled: bool,
}

impl PaymentDescriptor {
    /// The only value this system ever produces.
    pub const DISABLED: Self = Self { enabled: false };
}

impl Default for PaymentDescriptor {
    fn default() -> Self {
        Self::DISABLED
    }
}

/// Display totals, recomputed from items on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Price,
    pub tax: Price,
    pub delivery_fee: Price,
    pub total: Price,
}

impl OrderTotals {
    /// Compute totals from line items. Tax is 10% of the subtotal,
    /// rounded to the currency's precision.
    #[must_use]
    pub fn compute(items: &[OrderItem], delivery_fee: Decimal, currency: CurrencyCode) -> Self {
        let subtotal: Decimal = items.iter().map(OrderItem::line_total).sum();
        let tax = (subtotal * tax_rate()).round_dp(currency.decimal_places());
        Self {
            subtotal: Price::new(subtotal, currency),
            tax: Price::new(tax, currency),
            delivery_fee: Price::new(delivery_fee, currency),
            total: Price::new(subtotal + tax + delivery_fee, currency),
        }
    }
}

/// An order document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub store_id: StoreId,
    /// Display name of the store, denormalized for notification copy.
    pub store_name: String,
    /// Human-readable order number, e.g. `A-1042`.
    pub order_number: String,
    pub items: Vec<OrderItem>,
    /// Cache of the latest history entry's status. History is the source
    /// of truth; see [`Order::current_status`].
    pub status: OrderStatus,
    pub contact: CustomerContact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<DeliveryAddress>,
    #[serde(default)]
    pub payment: PaymentDescriptor,
    pub delivery_fee: Decimal,
    #[serde(default)]
    pub currency: CurrencyCode,
    /// Registered customer who placed the order, absent for guests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_user_id: Option<UserId>,
    /// Append-only status history, oldest first.
    #[serde(default)]
    pub history: Vec<OrderStatusHistoryEntry>,
    /// Idempotency token of the last applied status mutation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_mutation_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Recompute display totals from the current items.
    #[must_use]
    pub fn totals(&self) -> OrderTotals {
        OrderTotals::compute(&self.items, self.delivery_fee, self.currency)
    }

    /// Total item quantity across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Current status per the history (most recent entry by timestamp),
    /// falling back to the denormalized cache for history-less orders.
    #[must_use]
    pub fn current_status(&self) -> OrderStatus {
        self.history
            .iter()
            .max_by_key(|e| e.created_at)
            .map_or(self.status, |e| e.status)
    }
}

/// Payload of an order-creation request, as queued by the offline retry
/// queue. This lives at the client boundary, so it carries unmasked
/// contact details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub store_id: StoreId,
    pub items: Vec<OrderItem>,
    pub customer_name: String,
    pub customer_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<DeliveryAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// One entry in the durable local retry queue for failed order creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryQueueEntry {
    pub id: Uuid,
    pub request: CreateOrderRequest,
    pub timestamp: DateTime<Utc>,
    pub retry_count: u32,
}

impl RetryQueueEntry {
    /// Wrap a request for its first queue insertion.
    #[must_use]
    pub fn new(request: CreateOrderRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            timestamp: Utc::now(),
            retry_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, quantity: u32, unit_price: i64) -> OrderItem {
        OrderItem {
            name: name.to_string(),
            quantity,
            unit_price: Decimal::from(unit_price),
            options: Vec::new(),
        }
    }

    #[test]
    fn test_line_total_includes_options() {
        let mut bowl = item("bibimbap", 2, 9000);
        bowl.options.push(ItemOption {
            name: "extra egg".to_string(),
            price_delta: Decimal::from(1000),
        });
        assert_eq!(bowl.line_total(), Decimal::from(20_000));
    }

    #[test]
    fn test_totals_recomputed_from_items() {
        let items = vec![item("kimbap", 3, 3500), item("tteokbokki", 1, 6000)];
        let totals = OrderTotals::compute(&items, Decimal::from(3000), CurrencyCode::KRW);

        assert_eq!(totals.subtotal.amount, Decimal::from(16_500));
        assert_eq!(totals.tax.amount, Decimal::from(1650));
        assert_eq!(totals.delivery_fee.amount, Decimal::from(3000));
        assert_eq!(totals.total.amount, Decimal::from(21_150));
    }

    #[test]
    fn test_mask_name() {
        assert_eq!(mask_name("김민수"), "김*수");
        assert_eq!(mask_name("이서"), "이*");
        assert_eq!(mask_name("박"), "*");
        assert_eq!(mask_name("Christina"), "C*******a");
        assert_eq!(mask_name(""), "");
    }

    #[test]
    fn test_mask_phone_keeps_prefix_and_last_four() {
        assert_eq!(mask_phone("010-1234-5678"), "010-****-5678");
        assert_eq!(mask_phone("01012345678"), "010****5678");
    }

    #[test]
    fn test_mask_phone_short_number() {
        // Fewer than eight digits: prefix and suffix windows overlap,
        // nothing left to mask.
        assert_eq!(mask_phone("1234567"), "1234567");
    }

    #[test]
    fn test_unmasked_contact_never_serialized() {
        let contact = CustomerContact::from_unmasked("김민수", "010-1234-5678");
        let json = serde_json::to_string(&contact).expect("serialize");
        assert!(!json.contains("김민수"));
        assert!(!json.contains("1234"));
        assert!(json.contains("김*수"));
    }

    #[test]
    fn test_payment_always_disabled() {
        assert!(!PaymentDescriptor::default().enabled);
        assert!(!PaymentDescriptor::DISABLED.enabled);
    }

    #[test]
    fn test_retry_queue_entry_starts_at_zero() {
        let entry = RetryQueueEntry::new(CreateOrderRequest {
            store_id: StoreId::new("store-1"),
            items: vec![item("kimbap", 1, 3500)],
            customer_name: "김민수".to_string(),
            customer_phone: "010-1234-5678".to_string(),
            delivery_address: None,
            note: None,
        });
        assert_eq!(entry.retry_count, 0);
    }
}
