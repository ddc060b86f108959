//! Block-lattice ledger.
//!
//! Every account owns its own hash-linked chain of blocks. Chains are linked
//! to each other only through Send → Receive pairs: a Receive names the hash
//! of the Send it consumes, and no Send may be consumed twice.
//!
//! Blocks are dual-signed: once by the owning account and once by the forger
//! that witnessed them. Witnessing and forger rotation live in
//! `vigil-consensus`; this crate owns the data model and its invariants.

pub mod account;
pub mod account_chain;
pub mod block;
pub mod blueprint;
pub mod error;
pub mod genesis;
pub mod ledger;
pub mod snapshot;

pub use account::Account;
pub use account_chain::AccountChain;
pub use block::{
    Block, BlockSignatures, BlockType, ChangeBlock, ChangeHashables, DelegateBlock,
    DelegateHashables, OpenBlock, OpenHashables, ReceiveBlock, ReceiveHashables, SendBlock,
    SendHashables,
};
pub use blueprint::{Blueprint, BlueprintPayload};
pub use error::{LedgerError, ValidationError};
pub use genesis::open_genesis_account;
pub use ledger::{Ledger, LedgerSummary};
pub use snapshot::{AccountSnapshot, LedgerSnapshot};
