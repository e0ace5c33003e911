//! Type-safe price representation using decimal arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., won, dollars).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero price in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency_code,
        }
    }

    /// Round the amount to the currency's standard number of decimal places.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self {
            amount: self.amount.round_dp(self.currency_code.decimal_places()),
            currency_code: self.currency_code,
        }
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    KRW,
    USD,
}

impl CurrencyCode {
    /// Number of decimal places in the currency's standard unit.
    #[must_use]
    pub const fn decimal_places(self) -> u32 {
        match self {
            Self::KRW => 0,
            Self::USD => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_krw_rounds_to_whole_won() {
        let price = Price::new(Decimal::new(15005, 1), CurrencyCode::KRW); // 1500.5
        assert_eq!(price.rounded().amount, Decimal::new(1500, 0));
    }

    #[test]
    fn test_usd_rounds_to_cents() {
        let price = Price::new(Decimal::new(19995, 3), CurrencyCode::USD); // 19.995
        assert_eq!(price.rounded().amount, Decimal::new(2000, 2));
    }

    #[test]
    fn test_zero() {
        assert_eq!(Price::zero(CurrencyCode::KRW).amount, Decimal::ZERO);
    }
}
