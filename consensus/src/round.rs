//! Forger rotation.
//!
//! A round is an ordered list of elected forgers and the index of whose turn
//! it is. Every successful forge advances the index by one; once it wraps
//! the round has ended and the DPoS layer elects a new one. Nothing here
//! runs on a timer.

use serde::{Deserialize, Serialize};
use tracing::debug;
use vigil_ledger::{Block, BlockType, Blueprint, BlueprintPayload, Ledger};
use vigil_types::{AccountId, BlockHash, Timestamp};

use crate::delegate::Delegate;
use crate::error::ConsensusError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    forgers: Vec<Delegate>,
    index: usize,
}

impl Round {
    /// Take the first `max_forgers` of the ranked delegates.
    pub fn new(mut delegates: Vec<Delegate>, max_forgers: usize) -> Self {
        delegates.truncate(max_forgers);
        Self {
            forgers: delegates,
            index: 0,
        }
    }

    pub fn forgers(&self) -> &[Delegate] {
        &self.forgers
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// True once every forger has had its turn, or if there are none.
    pub fn has_ended(&self) -> bool {
        self.forgers.is_empty() || (self.index != 0 && self.index % self.forgers.len() == 0)
    }

    /// The delegate whose turn it is.
    pub fn forger(&self) -> Result<&Delegate, ConsensusError> {
        if self.has_ended() {
            return Err(ConsensusError::RoundEnded);
        }
        self.forgers
            .get(self.index)
            .ok_or(ConsensusError::RoundEnded)
    }

    /// Build the concrete block `blueprint` describes for `account`, witness
    /// it with the current forger's key, and pass the turn on.
    ///
    /// The returned block carries only the witness signature; the owner signs
    /// it afterwards.
    pub fn forge(
        &mut self,
        ledger: &Ledger,
        account: &AccountId,
        blueprint: &Blueprint,
        timestamp: Timestamp,
    ) -> Result<Block, ConsensusError> {
        let forger = self.forger()?.account;
        let previous = resolve_previous(ledger, account, blueprint)?;

        let mut block = match &blueprint.payload {
            BlueprintPayload::Open => Block::open(*account, blueprint.balance, timestamp),
            BlueprintPayload::Send { destination } => {
                Block::send(blueprint.balance, *destination, previous, timestamp)
            }
            BlueprintPayload::Receive { source } => Block::receive(
                blueprint.balance,
                previous,
                source.unwrap_or(BlockHash::ZERO),
                timestamp,
            ),
            BlueprintPayload::Change { changes } => {
                Block::change(blueprint.balance, changes.clone(), previous, timestamp)
            }
            BlueprintPayload::Delegate { share } => {
                Block::delegate(blueprint.balance, previous, *share, timestamp)
            }
        };

        let witness = ledger
            .account(&forger)
            .ok_or_else(|| ConsensusError::ForgeFailed {
                reason: format!("forger {forger} is not in the ledger"),
            })?;
        block.sign_witness(witness.private_key());

        debug!(
            forger = %forger,
            account = %account,
            block_type = %block.block_type(),
            index = self.index,
            "block forged"
        );
        self.index += 1;
        Ok(block)
    }
}

/// The hash the new block links to. Open blocks need an unopened chain;
/// every other type needs the previous block to exist in the account's chain.
fn resolve_previous(
    ledger: &Ledger,
    account: &AccountId,
    blueprint: &Blueprint,
) -> Result<BlockHash, ConsensusError> {
    let block_type = blueprint.block_type();
    match (block_type, blueprint.previous) {
        (BlockType::Open, Some(_)) => Err(ConsensusError::InvalidBlockType {
            block_type,
            reason: "open blueprint names a previous block",
        }),
        (BlockType::Open, None) if ledger.is_opened(account) => {
            Err(ConsensusError::InvalidBlockType {
                block_type,
                reason: "account is already opened",
            })
        }
        (BlockType::Open, None) => Ok(BlockHash::ZERO),
        (_, None) => Err(ConsensusError::InvalidBlockType {
            block_type,
            reason: "blueprint has no previous block",
        }),
        (_, Some(previous)) => {
            if ledger.block_account(&previous) != Some(*account) {
                return Err(ConsensusError::ForgeFailed {
                    reason: format!("previous block {previous} is not in the account chain"),
                });
            }
            Ok(previous)
        }
    }
}
