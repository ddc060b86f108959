//! Blueprints: validated, unsigned descriptions of an intended block.
//!
//! A blueprint exists only between request submission and forging. The
//! account factories produce it after local validation; the forging round
//! turns it into a concrete [`Block`](crate::Block).

use crate::block::BlockType;
use serde::{Deserialize, Serialize};
use vigil_types::{AccountId, Amount, BlockHash, RewardShare, VoteChange};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    /// Chain tip this blueprint extends. `None` only for Open.
    pub previous: Option<BlockHash>,
    /// Resulting balance of the block that will be forged.
    pub balance: Amount,
    /// Value moved by a Send or credited by a Receive; zero otherwise.
    pub amount: Amount,
    pub payload: BlueprintPayload,
}

/// Type-specific part of a blueprint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlueprintPayload {
    Open,
    Send { destination: AccountId },
    /// `source: None` is a protocol reward credit. Only the node's payout
    /// issues those; requests carrying one are refused.
    Receive { source: Option<BlockHash> },
    Change { changes: Vec<VoteChange> },
    Delegate { share: RewardShare },
}

impl Blueprint {
    pub fn block_type(&self) -> BlockType {
        match self.payload {
            BlueprintPayload::Open => BlockType::Open,
            BlueprintPayload::Send { .. } => BlockType::Send,
            BlueprintPayload::Receive { .. } => BlockType::Receive,
            BlueprintPayload::Change { .. } => BlockType::Change,
            BlueprintPayload::Delegate { .. } => BlockType::Delegate,
        }
    }
}
