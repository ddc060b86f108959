//! Delegated proof-of-stake consensus.
//!
//! Accounts vote for delegates; a delegate's weight is the sum of the
//! balances of its voters. The heaviest delegates (up to `max_forgers`) form a
//! round and take turns witnessing every block. When every forger has had
//! its turn the round ends and a new one is elected on the next request.
//!
//! ## Module overview
//!
//! - [`weights`]: weight aggregation and deterministic ranking.
//! - [`election`]: vote-token parsing, the vote limit, and Change-block chunking.
//! - [`round`]: forger rotation and forging.
//! - [`dpos`]: delegate registry and lazy re-election.

pub mod delegate;
pub mod dpos;
pub mod election;
pub mod error;
pub mod round;
pub mod weights;

pub use delegate::Delegate;
pub use dpos::Dpos;
pub use election::{check_max_delegate_limit, parse_vote_token, plan_vote_chunk, vote_chunks};
pub use error::ConsensusError;
pub use round::Round;
pub use weights::{calculate_weights, WeightTable};
