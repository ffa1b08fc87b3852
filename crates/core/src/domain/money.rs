// Money Value Object
//
// Amounts are exact counts of minor units (cents). Binary floating point is
// never used for revenue.

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fraction digits carried by every amount
pub const MINOR_DIGITS: u32 = 2;

const MINOR_PER_MAJOR: i64 = 100;

/// Monetary amount in minor units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Sum a sequence of amounts, failing on overflow instead of wrapping
    pub fn try_sum<I>(amounts: I) -> Result<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, m| acc.checked_add(m))
            .ok_or(DomainError::MoneyOverflow)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = MINOR_PER_MAJOR as u64;
        write!(f, "{}{}.{:02}", sign, abs / per, abs % per)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    /// Parse a decimal string such as `12500.5`, `12500.50`, `-3.07` or `42`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DomainError::InvalidMoney(s.to_string());

        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if frac.len() > MINOR_DIGITS as usize {
            return Err(invalid());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };

        // "5" in the first fraction slot means 50 cents
        let mut frac_value: i64 = 0;
        for i in 0..MINOR_DIGITS as usize {
            let digit = frac.as_bytes().get(i).map(|b| (b - b'0') as i64).unwrap_or(0);
            frac_value = frac_value * 10 + digit;
        }

        let cents = whole_value
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|c| c.checked_add(frac_value))
            .ok_or_else(invalid)?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}
