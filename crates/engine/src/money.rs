use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// Signed money amount in integer **minor units** (cents).
///
/// Every ledger amount and balance goes through this type, so no
/// floating-point drift can creep into the running room total. There are no
/// arithmetic operators: sums and differences go through the `checked_*`
/// methods, or the `try_*` ones that turn an overflow into a
/// [`EngineError::Validation`].
///
/// ```rust
/// use engine::Money;
///
/// let amount: Money = "12,5".parse().unwrap();
/// assert_eq!(amount.minor(), 1250);
/// assert_eq!(amount.to_string(), "12.50");
/// assert!("0.001".parse::<Money>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Checked negation (`None` only for `i64::MIN`).
    #[must_use]
    pub fn checked_neg(self) -> Option<Money> {
        self.0.checked_neg().map(Money)
    }

    pub fn try_add(self, rhs: Money) -> ResultEngine<Money> {
        self.checked_add(rhs)
            .ok_or_else(|| out_of_range(format_args!("{self} + {rhs}")))
    }

    pub fn try_sub(self, rhs: Money) -> ResultEngine<Money> {
        self.checked_sub(rhs)
            .ok_or_else(|| out_of_range(format_args!("{self} - {rhs}")))
    }

    pub fn try_neg(self) -> ResultEngine<Money> {
        self.checked_neg()
            .ok_or_else(|| out_of_range(format_args!("-({self})")))
    }

    /// Sums without intermediate overflow; only a total outside `i64`
    /// fails.
    pub fn try_sum(amounts: impl IntoIterator<Item = Money>) -> ResultEngine<Money> {
        let total: i128 = amounts.into_iter().map(|amount| i128::from(amount.0)).sum();
        i64::try_from(total)
            .map(Money)
            .map_err(|_| out_of_range(format_args!("sum {total}")))
    }
}

fn out_of_range(what: fmt::Arguments<'_>) -> EngineError {
    EngineError::Validation(format!("amount out of range: {what}"))
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses `"10"`, `"10.5"`, `"10,50"` or `"-3.20"`; at most two fractional
    /// digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |why: &str| EngineError::Validation(format!("invalid amount: {why}"));

        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        if digits.is_empty() {
            return Err(invalid("empty"));
        }

        let normalized = digits.replace(',', ".");
        let (units, fraction) = normalized
            .split_once('.')
            .unwrap_or((normalized.as_str(), ""));
        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if units.is_empty() || !all_digits(units) || !all_digits(fraction) {
            return Err(invalid("not a number"));
        }
        if fraction.len() > 2 {
            return Err(invalid("too many decimals"));
        }

        let units: i64 = units.parse().map_err(|_| invalid("too large"))?;
        let cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid("not a number"))? * 10,
            _ => fraction.parse::<i64>().map_err(|_| invalid("not a number"))?,
        };
        let total = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(|| invalid("too large"))?;

        Ok(Money(if negative { -total } else { total }))
    }
}
