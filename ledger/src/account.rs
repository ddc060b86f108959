//! Accounts and their blueprint factories.
//!
//! Each factory validates the intent locally and returns a [`Blueprint`], so
//! an invalid request never reaches forging. Every factory first checks that
//! the supplied chain tip verifies under the account's own key: a blueprint
//! is never built on top of a tip the account did not sign.

use std::collections::BTreeSet;
use std::fmt;

use vigil_crypto::{derive_account_id, generate_keypair};
use vigil_types::{
    AccountId, Amount, KeyPair, PrivateKey, ProtocolParams, PublicKey, RewardShare, VoteChange,
};

use crate::block::Block;
use crate::blueprint::{Blueprint, BlueprintPayload};
use crate::error::ValidationError;

/// A ledger participant.
pub struct Account {
    id: AccountId,
    keys: KeyPair,
    /// Set once a Delegate block has been forged for this account.
    pub is_delegate: bool,
    /// Delegates this account currently votes for.
    pub voted_delegates: BTreeSet<AccountId>,
    /// Portion of forging rewards redistributed to voters. Only meaningful
    /// while `is_delegate`.
    pub reward_share: RewardShare,
    pub forged_count: u64,
    pub missed_count: u64,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("is_delegate", &self.is_delegate)
            .field("voted_delegates", &self.voted_delegates.len())
            .field("reward_share", &self.reward_share)
            .field("forged_count", &self.forged_count)
            .field("missed_count", &self.missed_count)
            .finish()
    }
}

impl Account {
    pub fn new(keys: KeyPair) -> Self {
        Self {
            id: derive_account_id(&keys.public),
            keys,
            is_delegate: false,
            voted_delegates: BTreeSet::new(),
            reward_share: RewardShare::NONE,
            forged_count: 0,
            missed_count: 0,
        }
    }

    /// A fresh account with a random key.
    pub fn generate() -> Self {
        Self::new(generate_keypair())
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.keys.public
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.keys.private
    }

    pub fn votes_for(&self, delegate: &AccountId) -> bool {
        self.voted_delegates.contains(delegate)
    }

    /// Apply the vote delta carried by a Change block.
    pub fn apply_vote_changes(&mut self, changes: &[VoteChange]) {
        for change in changes {
            match change {
                VoteChange::Add(delegate) => {
                    self.voted_delegates.insert(*delegate);
                }
                VoteChange::Remove(delegate) => {
                    self.voted_delegates.remove(delegate);
                }
            }
        }
    }

    fn verify_previous(&self, prev: &Block) -> Result<(), ValidationError> {
        if prev.verify(&self.keys.public) {
            Ok(())
        } else {
            Err(ValidationError::SignatureInvalid)
        }
    }

    /// Non-genesis accounts open at zero and are funded by a Send.
    pub fn create_open_block(&self) -> Blueprint {
        Blueprint {
            previous: None,
            balance: Amount::ZERO,
            amount: Amount::ZERO,
            payload: BlueprintPayload::Open,
        }
    }

    pub fn create_send_block(
        &self,
        params: &ProtocolParams,
        amount: Amount,
        destination: AccountId,
        prev: &Block,
    ) -> Result<Blueprint, ValidationError> {
        self.verify_previous(prev)?;
        let needed = amount
            .checked_add(params.transaction_fee)
            .ok_or(ValidationError::BalanceOverflow)?;
        let balance = debit(prev.balance(), needed)?;
        Ok(Blueprint {
            previous: Some(prev.hash()),
            balance,
            amount,
            payload: BlueprintPayload::Send { destination },
        })
    }

    /// Credit `amount` from `source`, a Send signed by `sender_key`.
    pub fn create_receive_block(
        &self,
        amount: Amount,
        prev: &Block,
        source: &Block,
        sender_key: &PublicKey,
    ) -> Result<Blueprint, ValidationError> {
        self.verify_previous(prev)?;
        if !source.verify(sender_key) {
            return Err(ValidationError::SignatureInvalid);
        }
        if source.destination().is_none() {
            return Err(ValidationError::NotASend);
        }
        Ok(Blueprint {
            previous: Some(prev.hash()),
            balance: credit(prev.balance(), amount)?,
            amount,
            payload: BlueprintPayload::Receive {
                source: Some(source.hash()),
            },
        })
    }

    /// Credit an internally generated protocol reward. There is no Send to
    /// verify.
    pub fn create_reward_block(
        &self,
        amount: Amount,
        prev: &Block,
    ) -> Result<Blueprint, ValidationError> {
        self.verify_previous(prev)?;
        Ok(Blueprint {
            previous: Some(prev.hash()),
            balance: credit(prev.balance(), amount)?,
            amount,
            payload: BlueprintPayload::Receive { source: None },
        })
    }

    pub fn create_change_block(
        &self,
        params: &ProtocolParams,
        changes: Vec<VoteChange>,
        prev: &Block,
    ) -> Result<Blueprint, ValidationError> {
        self.verify_previous(prev)?;
        if changes.len() > params.max_delegates_per_block {
            return Err(ValidationError::TooManyChanges {
                count: changes.len(),
                max: params.max_delegates_per_block,
            });
        }
        let balance = debit(prev.balance(), params.change_cost())?;
        Ok(Blueprint {
            previous: Some(prev.hash()),
            balance,
            amount: Amount::ZERO,
            payload: BlueprintPayload::Change { changes },
        })
    }

    pub fn create_delegate_block(
        &self,
        params: &ProtocolParams,
        prev: &Block,
        share_percent: f64,
    ) -> Result<Blueprint, ValidationError> {
        self.verify_previous(prev)?;
        let share = RewardShare::from_percent(share_percent).ok_or(
            ValidationError::InvalidShare {
                percent: share_percent,
            },
        )?;
        if self.is_delegate {
            return Err(ValidationError::AlreadyDelegate);
        }
        let balance = debit(prev.balance(), params.delegate_cost())?;
        Ok(Blueprint {
            previous: Some(prev.hash()),
            balance,
            amount: Amount::ZERO,
            payload: BlueprintPayload::Delegate { share },
        })
    }
}

fn debit(available: Amount, needed: Amount) -> Result<Amount, ValidationError> {
    available
        .checked_sub(needed)
        .ok_or(ValidationError::InsufficientFunds { needed, available })
}

fn credit(balance: Amount, amount: Amount) -> Result<Amount, ValidationError> {
    balance
        .checked_add(amount)
        .ok_or(ValidationError::BalanceOverflow)
}
