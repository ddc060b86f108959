//! Account identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte account identifier, derived deterministically from a public key
/// by `vigil_crypto::derive_account_id`.
///
/// The core treats it as an opaque, ordered byte key. Ordering is significant:
/// it breaks ties between equally weighted delegates and fixes the order in
/// which stakeholders are paid.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId([u8; 32]);

impl AccountId {
    /// Prefix used by the human-readable form.
    pub const PREFIX: &'static str = "vgl_";

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AccountId({}{}\u{2026})",
            Self::PREFIX,
            crate::block::hex::encode(&self.0[..4])
        )
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, crate::block::hex::encode(&self.0))
    }
}
