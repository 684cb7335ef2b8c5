//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(10,2)` in the database and never pass
//! through floating point. Line totals and cart subtotals are computed with
//! [`Price::times`] and [`Price::sum`].

use std::fmt;
use std::ops::Add;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::Quantity;

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
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

    /// A price in the store's default currency.
    #[must_use]
    pub fn usd(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::USD)
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Price of `quantity` units at this unit price.
    #[must_use]
    pub fn times(self, quantity: Quantity) -> Self {
        Self::new(
            self.amount * Decimal::from(quantity.get()),
            self.currency_code,
        )
    }

    /// Sum prices; `None` when the iterator mixes currencies.
    ///
    /// An empty iterator sums to zero in the default currency.
    pub fn sum<I>(prices: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        let mut iter = prices.into_iter();
        let Some(first) = iter.next() else {
            return Some(Self::zero(CurrencyCode::default()));
        };
        iter.try_fold(first, |acc, next| {
            (acc.currency_code == next.currency_code).then(|| acc + next)
        })
    }

    /// Amount rounded to cents (banker's rounding is avoided; half rounds up).
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        self.amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.rounded())
    }
}

impl Add for Price {
    type Output = Self;

    /// Adds amounts; callers are expected to have checked the currencies match.
    fn add(self, rhs: Self) -> Self::Output {
        debug_assert_eq!(self.currency_code, rhs.currency_code);
        Self::new(self.amount + rhs.amount, self.currency_code)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn usd(s: &str) -> Price {
        Price::usd(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_display_pads_cents() {
        assert_eq!(usd("19.9").display(), "$19.90");
        assert_eq!(usd("5").display(), "$5.00");
        assert_eq!(
            Price::new(Decimal::from(12), CurrencyCode::GBP).to_string(),
            "£12.00"
        );
    }

    #[test]
    fn test_display_rounds_half_up() {
        assert_eq!(usd("0.125").display(), "$0.13");
    }

    #[test]
    fn test_times_quantity() {
        let line = usd("24.99").times(Quantity::new(3).unwrap());
        assert_eq!(line, usd("74.97"));
    }

    #[test]
    fn test_sum_same_currency() {
        let total = Price::sum([usd("10.00"), usd("2.50"), usd("0.49")]).unwrap();
        assert_eq!(total, usd("12.99"));
    }

    #[test]
    fn test_sum_empty_is_zero() {
        assert_eq!(Price::sum([]).unwrap(), usd("0"));
    }

    #[test]
    fn test_sum_mixed_currency_is_none() {
        let eur = Price::new(Decimal::ONE, CurrencyCode::EUR);
        assert!(Price::sum([usd("1"), eur]).is_none());
    }
}
