use serde::{Deserialize, Serialize};
use vigil_ledger::{BlockType, Blueprint};
use vigil_types::{AccountId, Amount, BlockHash};

/// Ask the node to forge and append `blueprint` on `account`'s chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub account: AccountId,
    pub blueprint: Blueprint,
}

impl Request {
    pub fn new(account: AccountId, blueprint: Blueprint) -> Self {
        Self { account, blueprint }
    }
}

/// One reward credit appended by a payout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutCredit {
    pub account: AccountId,
    pub amount: Amount,
    pub hash: BlockHash,
}

/// A reward credit that could not be applied. The reward it carried is
/// not minted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutWarning {
    pub account: AccountId,
    pub amount: Amount,
    pub reason: String,
}

/// Credits and warnings from distributing one or more rewards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutReport {
    pub credits: Vec<PayoutCredit>,
    pub warnings: Vec<PayoutWarning>,
}

impl PayoutReport {
    /// Total amount credited.
    pub fn credited(&self) -> Amount {
        self.credits
            .iter()
            .fold(Amount::ZERO, |total, credit| total.saturating_add(credit.amount))
    }
}

/// Result of a processed request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOutcome {
    /// Hash of the requested block.
    pub hash: BlockHash,
    pub block_type: BlockType,
    /// Delegate that witnessed the requested block.
    pub forger: AccountId,
    /// Reward minted for forging the requested block.
    pub reward: Amount,
    /// The Receive that consumed a Send, if this was a Send.
    pub paired_receive: Option<BlockHash>,
    pub credits: Vec<PayoutCredit>,
    pub warnings: Vec<PayoutWarning>,
}
