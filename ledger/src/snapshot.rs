//! Ledger snapshots: capture the state of all accounts at a point in time.
//!
//! The snapshot hash is computed deterministically from the account state so
//! two nodes that processed the same requests can compare ledgers cheaply.
//! Snapshots export to JSON for inspection and to bincode for storage.

use serde::{Deserialize, Serialize};

use vigil_crypto::blake2b_256_multi;
use vigil_types::{AccountId, Amount, BlockHash, RewardShare, Timestamp};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Blake2b of the account entries and block count.
    pub hash: BlockHash,
    /// Total number of blocks across all chains.
    pub block_count: u64,
    /// Not covered by the hash.
    pub created_at: Timestamp,
    pub accounts: Vec<AccountSnapshot>,
    pub version: u32,
}

/// The state of a single account captured in a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub id: AccountId,
    pub username: String,
    /// Head of the chain; zero if the account was never opened.
    pub head: BlockHash,
    pub block_count: u64,
    /// Balance of the head block.
    pub balance: Amount,
    pub is_delegate: bool,
    pub reward_share: RewardShare,
    pub voted_delegates: Vec<AccountId>,
    pub forged_count: u64,
    pub missed_count: u64,
}

impl LedgerSnapshot {
    pub const VERSION: u32 = 1;

    pub fn create(accounts: Vec<AccountSnapshot>, block_count: u64, created_at: Timestamp) -> Self {
        let mut snap = Self {
            hash: BlockHash::ZERO,
            block_count,
            created_at,
            accounts,
            version: Self::VERSION,
        };
        snap.hash = snap.compute_hash();
        snap
    }

    fn compute_hash(&self) -> BlockHash {
        let mut buffer = Vec::with_capacity(self.accounts.len() * 160 + 8);
        for account in &self.accounts {
            buffer.extend_from_slice(account.id.as_bytes());
            buffer.extend_from_slice(&(account.username.len() as u32).to_be_bytes());
            buffer.extend_from_slice(account.username.as_bytes());
            buffer.extend_from_slice(account.head.as_bytes());
            buffer.extend_from_slice(&account.block_count.to_be_bytes());
            buffer.extend_from_slice(&account.balance.raw().to_be_bytes());
            buffer.push(account.is_delegate as u8);
            buffer.extend_from_slice(&account.reward_share.basis_points().to_be_bytes());
            buffer.extend_from_slice(&(account.voted_delegates.len() as u32).to_be_bytes());
            for delegate in &account.voted_delegates {
                buffer.extend_from_slice(delegate.as_bytes());
            }
            buffer.extend_from_slice(&account.forged_count.to_be_bytes());
            buffer.extend_from_slice(&account.missed_count.to_be_bytes());
        }
        BlockHash::new(blake2b_256_multi(&[&buffer, &self.block_count.to_be_bytes()]))
    }

    /// Verify the snapshot hash matches the account data.
    pub fn verify(&self) -> bool {
        self.hash == self.compute_hash()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }
}
