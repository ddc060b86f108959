//! Cryptographic primitives for the Vigil ledger.
//!
//! The ledger core only consumes three capabilities from this crate:
//! - **Ed25519** signing and verification over a block digest
//! - **Blake2b-256** digests for block hashes
//! - Deterministic [`AccountId`](vigil_types::AccountId) derivation from a public key

pub mod account;
pub mod hash;
pub mod keys;
pub mod sign;

pub use account::derive_account_id;
pub use hash::{blake2b_256, blake2b_256_multi, hash_block};
pub use keys::{generate_keypair, keypair_from_private, keypair_from_seed, public_from_private};
pub use sign::{sign_message, verify_signature};
