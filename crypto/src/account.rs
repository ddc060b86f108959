//! Account identifier derivation.

use crate::hash::blake2b_256_multi;
use vigil_types::{AccountId, PublicKey};

/// Domain separator so an account id can never collide with a block hash.
const ACCOUNT_DOMAIN: &[u8] = b"vigil-account";

/// Derive the account identifier owned by `public_key`.
pub fn derive_account_id(public_key: &PublicKey) -> AccountId {
    AccountId::new(blake2b_256_multi(&[ACCOUNT_DOMAIN, public_key.as_bytes()]))
}
