//! Protocol parameters: the fees, rewards and limits every validation and
//! reward computation consults.
//!
//! Changing any value changes consensus behaviour, so each schedule carries a
//! `version` that must be bumped alongside it.

use crate::amount::Amount;
use serde::{Deserialize, Serialize};

/// Fee, reward and limit schedule.
///
/// Built once at process start and passed by reference; nothing mutates it
/// afterwards. Amounts are written as decimal strings in TOML (`"0.1"`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParams {
    /// Schedule version.
    pub version: u32,

    // ── Fees ─────────────────────────────────────────────────────────────
    /// Charged on every Send, Change and Delegate block.
    #[serde(with = "decimal")]
    pub transaction_fee: Amount,

    /// Charged on every Change block, on top of the transaction fee.
    #[serde(with = "decimal")]
    pub voting_fee: Amount,

    /// Charged once when an account registers as a delegate.
    #[serde(with = "decimal")]
    pub delegate_fee: Amount,

    // ── Rewards ──────────────────────────────────────────────────────────
    /// Minted for the forger of every non-Receive block.
    #[serde(with = "decimal")]
    pub forge_reward: Amount,

    /// Opening balance of the genesis account.
    #[serde(with = "decimal")]
    pub genesis_balance: Amount,

    // ── Limits ───────────────────────────────────────────────────────────
    /// Maximum number of delegates a single account may vote for.
    pub max_delegates_per_account: usize,

    /// Maximum vote changes carried by one Change block.
    pub max_delegates_per_block: usize,

    /// Maximum number of forgers in a round.
    pub max_forgers: usize,
}

impl ProtocolParams {
    pub const CURRENT_VERSION: u32 = 1;

    /// The live schedule.
    pub fn vigil_defaults() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            transaction_fee: Amount::new(Amount::UNIT / 10), // 0.1
            voting_fee: Amount::from_units(1),
            delegate_fee: Amount::from_units(25),
            forge_reward: Amount::from_units(4),
            genesis_balance: Amount::from_units(100_000_000),
            max_delegates_per_account: 101,
            max_delegates_per_block: 33,
            max_forgers: 101,
        }
    }

    /// Total charged for a Change block.
    pub fn change_cost(&self) -> Amount {
        self.transaction_fee.saturating_add(self.voting_fee)
    }

    /// Total charged for a Delegate block.
    pub fn delegate_cost(&self) -> Amount {
        self.transaction_fee.saturating_add(self.delegate_fee)
    }
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self::vigil_defaults()
    }
}

/// Decimal-string serde for amounts (TOML has no 128-bit integers).
mod decimal {
    use crate::amount::Amount;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(amount)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
