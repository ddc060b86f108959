//! Delegate: an elected account and the stake behind it.

use serde::{Deserialize, Serialize};
use vigil_types::{AccountId, Amount};

/// Election-time view of a delegate. Recomputed at every new round, never
/// persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegate {
    pub account: AccountId,
    /// Sum of the tip balances of every account voting for this delegate.
    pub weight: Amount,
}

impl Delegate {
    pub fn new(account: AccountId, weight: Amount) -> Self {
        Self { account, weight }
    }
}
