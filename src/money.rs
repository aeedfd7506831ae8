use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Sub;
use std::str::FromStr;

/// Currency amount in minor units (paise). Stored as INTEGER.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Price of `quantity` units, or `None` if it does not fit.
    pub fn checked_times(self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Sum of amounts, or `None` on overflow.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, amount| acc.checked_add(amount))
    }

    /// Apply a percentage discount, rounding half away from zero to the
    /// nearest minor unit. Every price shown or persisted goes through here.
    pub fn discounted(self, percent: Decimal) -> Money {
        let hundred = Decimal::from(100);
        let scaled = Decimal::from(self.0) * (hundred - percent) / hundred;
        let rounded = scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Money(rounded.to_i64().unwrap_or(self.0))
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid amount: {0}")]
pub struct ParseMoneyError(String);

impl FromStr for Money {
    type Err = ParseMoneyError;

    /// Parses major units, e.g. `"12.5"` becomes 1250 minor units.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|_| ParseMoneyError(s.to_string()))?;
        if value.scale() > 2 {
            return Err(ParseMoneyError(s.to_string()));
        }
        (value * Decimal::from(100))
            .to_i64()
            .map(Money)
            .ok_or_else(|| ParseMoneyError(s.to_string()))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Money)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rs(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(rs("12.5"), Money::from_minor(1250));
        assert_eq!(rs("10"), Money::from_minor(1000));
        assert_eq!(Money::from_minor(1250).to_string(), "12.50");
        assert_eq!(Money::from_minor(5).to_string(), "0.05");
        assert!("1.005".parse::<Money>().is_err());
        assert!("ten".parse::<Money>().is_err());
    }

    #[test]
    fn test_discount_without_rounding() {
        assert_eq!(rs("40.00").discounted(dec!(25)), rs("30.00"));
        assert_eq!(rs("40.00").discounted(dec!(0)), rs("40.00"));
        assert_eq!(rs("40.00").discounted(dec!(100)), Money::ZERO);
    }

    #[test]
    fn test_discount_rounds_half_away_from_zero() {
        // 0.25 * 0.5 = 0.125 -> 0.13
        assert_eq!(rs("0.25").discounted(dec!(50)), rs("0.13"));
        // 19.99 * 0.85 = 16.9915 -> 16.99
        assert_eq!(rs("19.99").discounted(dec!(15)), rs("16.99"));
        // 33.33 * 0.875 = 29.16375 -> 29.16
        assert_eq!(rs("33.33").discounted(dec!(12.5)), rs("29.16"));
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(rs("10.00").checked_times(3), Some(rs("30.00")));
        assert_eq!(rs("25.00") - rs("20.00"), rs("5.00"));
        let total = Money::checked_sum([rs("1.10"), rs("2.20"), rs("3.30")]);
        assert_eq!(total, Some(rs("6.60")));
    }

    #[test]
    fn test_arithmetic_overflow_is_reported() {
        let huge = Money::from_minor(i64::MAX / 2);
        assert_eq!(huge.checked_times(2), Some(Money::from_minor(i64::MAX - 1)));
        assert_eq!(huge.checked_times(3), None);
        assert_eq!(huge.checked_add(huge).and_then(|m| m.checked_add(huge)), None);
        assert_eq!(Money::checked_sum([huge, huge, huge]), None);
    }
}
