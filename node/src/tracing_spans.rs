//! Span constructors for the node's main operations.
//!
//! Consistent span names and field sets make it easy to follow one request
//! through its paired Receive and reward credits.

use tracing::{info_span, Span};
use vigil_ledger::BlockType;
use vigil_types::{AccountId, Amount};

/// Span covering one request through the forge-and-append pipeline.
pub fn process_span(account: &AccountId, block_type: BlockType) -> Span {
    info_span!("process", account = %account, block_type = %block_type)
}

/// Span covering the distribution of one forge reward.
pub fn payout_span(forger: &AccountId, reward: Amount) -> Span {
    info_span!("payout", forger = %forger, reward = %reward)
}

/// Span covering an account's vote update.
pub fn election_span(account: &AccountId, tokens: usize) -> Span {
    info_span!("elect", account = %account, tokens)
}

/// Span covering the genesis delegate bootstrap.
pub fn genesis_span(count: usize) -> Span {
    info_span!("genesis", delegates = count)
}
