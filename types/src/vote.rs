//! Vote changes carried by Change blocks.

use crate::account::AccountId;
use serde::{Deserialize, Serialize};

/// One entry in a Change block's vote delta.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteChange {
    /// Start voting for a delegate.
    Add(AccountId),
    /// Withdraw an existing vote.
    Remove(AccountId),
}

impl VoteChange {
    pub fn delegate(&self) -> &AccountId {
        match self {
            Self::Add(id) | Self::Remove(id) => id,
        }
    }

    pub fn is_add(&self) -> bool {
        matches!(self, Self::Add(_))
    }

    /// The `+`/`-` symbol used by vote tokens.
    pub fn symbol(&self) -> char {
        match self {
            Self::Add(_) => '+',
            Self::Remove(_) => '-',
        }
    }
}
