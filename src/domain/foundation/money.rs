//! Money value object stored in minor units.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-negative amount of money in cents.
///
/// Integer minor units keep `unit_price * count` exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero amount; events priced at zero auto-confirm their bookings.
    pub const ZERO: Money = Money(0);

    /// Creates an amount from cents.
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents.
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// True when the amount is zero.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies by a seat count, `None` on overflow.
    pub fn checked_mul(&self, count: u32) -> Option<Money> {
        self.0.checked_mul(u64::from(count)).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}
