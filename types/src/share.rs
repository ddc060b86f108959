//! Delegate reward share.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The percentage of forging rewards a delegate passes on to its voters.
///
/// Stored as basis points (hundredths of a percent) so that it hashes and
/// compares deterministically; 10_000 basis points is 100%.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RewardShare(u16);

impl RewardShare {
    pub const MAX_BASIS_POINTS: u16 = 10_000;

    pub const NONE: Self = Self(0);
    pub const FULL: Self = Self(Self::MAX_BASIS_POINTS);

    /// Build a share from a percentage in `[0, 100]`.
    ///
    /// Returns `None` for NaN or out-of-range values. Precision beyond two
    /// decimal places is rounded to the nearest basis point.
    pub fn from_percent(percent: f64) -> Option<Self> {
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return None;
        }
        Some(Self((percent * 100.0).round() as u16))
    }

    pub fn from_basis_points(bps: u16) -> Option<Self> {
        (bps <= Self::MAX_BASIS_POINTS).then_some(Self(bps))
    }

    pub fn basis_points(&self) -> u16 {
        self.0
    }

    pub fn as_percent(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for RewardShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}
