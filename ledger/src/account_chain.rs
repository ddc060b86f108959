//! Per-account chain management.

use crate::block::Block;
use crate::error::LedgerError;
use vigil_types::{AccountId, BlockHash};

/// A single account's chain in the block-lattice.
///
/// Only opened accounts have a chain, so `blocks` is never empty once the
/// chain is held by the ledger.
#[derive(Clone, Debug)]
pub struct AccountChain {
    pub account: AccountId,
    /// Hash of the most recent (head) block.
    pub head: BlockHash,
    blocks: Vec<Block>,
}

impl AccountChain {
    pub fn new(account: AccountId) -> Self {
        Self {
            account,
            head: BlockHash::ZERO,
            blocks: Vec::new(),
        }
    }

    /// Validate that a new block can be appended to this chain.
    ///
    /// The first block must be an Open naming this account; every later
    /// block must be a non-Open whose `previous` is the current head.
    pub fn validate_append(&self, block: &Block) -> Result<(), LedgerError> {
        match (self.blocks.is_empty(), block) {
            (true, Block::Open(open)) => {
                if open.hashables.account != self.account {
                    return Err(LedgerError::InvalidBlock {
                        reason: "open block account does not match chain account".into(),
                    });
                }
                Ok(())
            }
            (true, _) => Err(LedgerError::NotOpened(self.account)),
            (false, Block::Open(_)) => Err(LedgerError::AlreadyOpened(self.account)),
            (false, _) => {
                if block.previous() != self.head {
                    return Err(LedgerError::BlockGap {
                        expected: self.head,
                        found: block.previous(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Append a validated block, updating the chain head.
    pub fn append(&mut self, block: Block, hash: BlockHash) {
        self.head = hash;
        self.blocks.push(block);
    }

    /// Remove the head block, restoring the previous head.
    pub fn pop(&mut self) -> Option<Block> {
        let block = self.blocks.pop()?;
        self.head = block.previous();
        Some(block)
    }

    pub fn latest(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn get(&self, height: usize) -> Option<&Block> {
        self.blocks.get(height)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block_count(&self) -> u64 {
        self.blocks.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Walk the whole chain checking the hash links: the first block is an
    /// Open with a zero previous, every later block points at the hash of its
    /// predecessor, and the head is the hash of the last block.
    pub fn verify_integrity(&self) -> bool {
        let Some(first) = self.blocks.first() else {
            return self.head.is_zero();
        };
        if !first.is_open() {
            return false;
        }
        let mut expected = first.hash();
        for block in &self.blocks[1..] {
            if block.is_open() || block.previous() != expected {
                return false;
            }
            expected = block.hash();
        }
        expected == self.head
    }
}
