//! Fundamental types for the Vigil ledger.
//!
//! Shared by every crate in the workspace: amounts, hashes, account
//! identifiers, keys, timestamps, reward shares, vote changes and the
//! protocol parameter schedule.

pub mod account;
pub mod amount;
pub mod block;
pub mod keys;
pub mod params;
pub mod share;
pub mod time;
pub mod vote;

pub use account::AccountId;
pub use amount::{Amount, ParseAmountError};
pub use block::BlockHash;
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use params::ProtocolParams;
pub use share::RewardShare;
pub use time::{Clock, SystemClock, Timestamp};
pub use vote::VoteChange;
