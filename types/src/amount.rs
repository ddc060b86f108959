//! Token amounts.
//!
//! Amounts are fixed-point integers (u128) to avoid floating-point errors.
//! The smallest unit is 1 raw; one whole coin is [`Amount::UNIT`] raw.

use crate::share::RewardShare;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Number of decimal places carried by [`Amount::UNIT`].
const DECIMALS: usize = 6;

/// A balance or transfer value, stored as raw units.
///
/// Unsigned by construction, so a balance can never go below zero. Use the
/// checked operations wherever an underflow is a validation failure.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Self = Self(0);

    /// Raw units per whole coin.
    pub const UNIT: u128 = 1_000_000;

    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Whole coins to raw units.
    pub const fn from_units(units: u128) -> Self {
        Self(units * Self::UNIT)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Divide evenly into `parts`, returning `(per_part, remainder)`.
    ///
    /// Returns `None` when `parts` is zero.
    pub fn split(self, parts: usize) -> Option<(Self, Self)> {
        if parts == 0 {
            return None;
        }
        let parts = parts as u128;
        Some((Self(self.0 / parts), Self(self.0 % parts)))
    }

    /// The portion of this amount covered by `share`, rounded down.
    pub fn percent_of(self, share: RewardShare) -> Self {
        let bps = share.basis_points() as u128;
        // Split the multiplication so large balances cannot overflow.
        let whole = self.0 / RewardShare::MAX_BASIS_POINTS as u128;
        let rest = self.0 % RewardShare::MAX_BASIS_POINTS as u128;
        Self(whole * bps + rest * bps / RewardShare::MAX_BASIS_POINTS as u128)
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:0width$}",
            self.0 / Self::UNIT,
            self.0 % Self::UNIT,
            width = DECIMALS
        )
    }
}

/// Error returned when parsing a decimal amount string.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid amount: {0:?}")]
pub struct ParseAmountError(pub String);

/// Parses `"12"`, `"0.1"` or `"69.900000"` into raw units.
impl FromStr for Amount {
    type Err = ParseAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseAmountError(s.to_string());
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() || frac.len() > DECIMALS {
            return Err(err());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(err());
        }
        let whole: u128 = whole.parse().map_err(|_| err())?;
        let mut frac_raw: u128 = 0;
        for (i, digit) in frac.bytes().enumerate() {
            frac_raw += (digit - b'0') as u128 * 10u128.pow((DECIMALS - 1 - i) as u32);
        }
        whole
            .checked_mul(Self::UNIT)
            .and_then(|w| w.checked_add(frac_raw))
            .map(Self)
            .ok_or_else(err)
    }
}
