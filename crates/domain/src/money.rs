//! Money amounts in integer cents.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// A USD amount in cents. Cart prices, capture amounts and purchase line
/// prices all travel as a bare integer of cents on the wire.
///
/// Amounts come from clients, so `+` and `Sum` saturate at the `i64`
/// bounds rather than overflow.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn from_dollars(dollars: i64) -> Self {
        Self(dollars * 100)
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Sum that reports `None` instead of overflowing.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", cents / 100, cents % 100)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_ceiling_in_cents() {
        assert_eq!(Money::from_dollars(150).cents(), 15_000);
    }

    #[test]
    fn test_display_as_dollars() {
        assert_eq!(Money::from_cents(1234).to_string(), "$12.34");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-$12.34");
    }

    #[test]
    fn test_cart_total_sum() {
        let total: Money = [600, 0, 2999].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 3599);

        let empty: Money = std::iter::empty().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_addition_saturates() {
        let total: Money = [Money::from_cents(100), Money::from_cents(i64::MAX)]
            .into_iter()
            .sum();
        assert_eq!(total.cents(), i64::MAX);

        let mut low = Money::from_cents(i64::MIN);
        low += Money::from_cents(-1);
        assert_eq!(low.cents(), i64::MIN);
    }

    #[test]
    fn test_checked_add_reports_overflow() {
        assert_eq!(
            Money::from_cents(100).checked_add(Money::from_cents(i64::MAX)),
            None
        );
        assert_eq!(
            Money::from_cents(100).checked_add(Money::from_cents(50)),
            Some(Money::from_cents(150))
        );
    }

    #[test]
    fn test_wire_format_is_bare_cents() {
        let json = serde_json::to_string(&Money::from_cents(2999)).unwrap();
        assert_eq!(json, "2999");
        let back: Money = serde_json::from_str("600").unwrap();
        assert_eq!(back, Money::from_cents(600));
    }
}
