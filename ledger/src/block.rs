//! Blocks: the five immutable units of ledger state.
//!
//! Every block carries the account's *resulting* balance (absolute, not a
//! delta), the hash of the block before it in the same chain, and two
//! signatures over the same digest: the owner's and the witnessing forger's.
//! A block is valid only once both verify.
//!
//! The digest is a canonical big-endian encoding of the hashables prefixed
//! with a one-byte type tag, so two blocks of different types can never share
//! a hash. Signatures are not part of the digest.

use serde::{Deserialize, Serialize};
use std::fmt;
use vigil_crypto::{hash_block, sign_message, verify_signature};
use vigil_types::{
    AccountId, Amount, BlockHash, PrivateKey, PublicKey, RewardShare, Signature, Timestamp,
    VoteChange,
};

/// The operation a block represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockType {
    /// First block of every chain.
    Open,
    /// Debit towards another account.
    Send,
    /// Credit of a matching Send, or of a protocol reward.
    Receive,
    /// Vote-set change.
    Change,
    /// Delegate registration.
    Delegate,
}

impl BlockType {
    fn tag(self) -> u8 {
        match self {
            BlockType::Open => 0,
            BlockType::Send => 1,
            BlockType::Receive => 2,
            BlockType::Change => 3,
            BlockType::Delegate => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Open => "open",
            BlockType::Send => "send",
            BlockType::Receive => "receive",
            BlockType::Change => "change",
            BlockType::Delegate => "delegate",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owner and witness signatures over the block digest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSignatures {
    pub owner: Option<Signature>,
    pub witness: Option<Signature>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenHashables {
    pub account: AccountId,
    pub balance: Amount,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendHashables {
    pub balance: Amount,
    pub destination: AccountId,
    pub previous: BlockHash,
    pub timestamp: Timestamp,
}

/// `source == BlockHash::ZERO` marks a protocol reward credit, which has no
/// paired Send.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveHashables {
    pub balance: Amount,
    pub previous: BlockHash,
    pub source: BlockHash,
    pub timestamp: Timestamp,
}

/// `changes` is the vote delta this block applies, not the full vote set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeHashables {
    pub balance: Amount,
    pub changes: Vec<VoteChange>,
    pub previous: BlockHash,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateHashables {
    pub balance: Amount,
    pub previous: BlockHash,
    pub share: RewardShare,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenBlock {
    pub hashables: OpenHashables,
    pub signatures: BlockSignatures,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendBlock {
    pub hashables: SendHashables,
    pub signatures: BlockSignatures,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveBlock {
    pub hashables: ReceiveHashables,
    pub signatures: BlockSignatures,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBlock {
    pub hashables: ChangeHashables,
    pub signatures: BlockSignatures,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateBlock {
    pub hashables: DelegateHashables,
    pub signatures: BlockSignatures,
}

/// A block in an account chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Block {
    Open(OpenBlock),
    Send(SendBlock),
    Receive(ReceiveBlock),
    Change(ChangeBlock),
    Delegate(DelegateBlock),
}

impl Block {
    /// Unsigned Open block.
    pub fn open(account: AccountId, balance: Amount, timestamp: Timestamp) -> Self {
        Block::Open(OpenBlock {
            hashables: OpenHashables {
                account,
                balance,
                timestamp,
            },
            signatures: BlockSignatures::default(),
        })
    }

    /// Unsigned Send block.
    pub fn send(
        balance: Amount,
        destination: AccountId,
        previous: BlockHash,
        timestamp: Timestamp,
    ) -> Self {
        Block::Send(SendBlock {
            hashables: SendHashables {
                balance,
                destination,
                previous,
                timestamp,
            },
            signatures: BlockSignatures::default(),
        })
    }

    /// Unsigned Receive block.
    pub fn receive(
        balance: Amount,
        previous: BlockHash,
        source: BlockHash,
        timestamp: Timestamp,
    ) -> Self {
        Block::Receive(ReceiveBlock {
            hashables: ReceiveHashables {
                balance,
                previous,
                source,
                timestamp,
            },
            signatures: BlockSignatures::default(),
        })
    }

    /// Unsigned Change block.
    pub fn change(
        balance: Amount,
        changes: Vec<VoteChange>,
        previous: BlockHash,
        timestamp: Timestamp,
    ) -> Self {
        Block::Change(ChangeBlock {
            hashables: ChangeHashables {
                balance,
                changes,
                previous,
                timestamp,
            },
            signatures: BlockSignatures::default(),
        })
    }

    /// Unsigned Delegate block.
    pub fn delegate(
        balance: Amount,
        previous: BlockHash,
        share: RewardShare,
        timestamp: Timestamp,
    ) -> Self {
        Block::Delegate(DelegateBlock {
            hashables: DelegateHashables {
                balance,
                previous,
                share,
                timestamp,
            },
            signatures: BlockSignatures::default(),
        })
    }

    pub fn block_type(&self) -> BlockType {
        match self {
            Block::Open(_) => BlockType::Open,
            Block::Send(_) => BlockType::Send,
            Block::Receive(_) => BlockType::Receive,
            Block::Change(_) => BlockType::Change,
            Block::Delegate(_) => BlockType::Delegate,
        }
    }

    /// Canonical digest both signatures are computed over.
    pub fn digest(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(128);
        buf.push(self.block_type().tag());
        match self {
            Block::Open(b) => {
                let h = &b.hashables;
                buf.extend_from_slice(h.account.as_bytes());
                buf.extend_from_slice(&h.balance.raw().to_be_bytes());
                buf.extend_from_slice(&h.timestamp.as_secs().to_be_bytes());
            }
            Block::Send(b) => {
                let h = &b.hashables;
                buf.extend_from_slice(&h.balance.raw().to_be_bytes());
                buf.extend_from_slice(h.destination.as_bytes());
                buf.extend_from_slice(h.previous.as_bytes());
                buf.extend_from_slice(&h.timestamp.as_secs().to_be_bytes());
            }
            Block::Receive(b) => {
                let h = &b.hashables;
                buf.extend_from_slice(&h.balance.raw().to_be_bytes());
                buf.extend_from_slice(h.previous.as_bytes());
                buf.extend_from_slice(h.source.as_bytes());
                buf.extend_from_slice(&h.timestamp.as_secs().to_be_bytes());
            }
            Block::Change(b) => {
                let h = &b.hashables;
                buf.extend_from_slice(&h.balance.raw().to_be_bytes());
                buf.extend_from_slice(&(h.changes.len() as u32).to_be_bytes());
                for change in &h.changes {
                    buf.push(change.symbol() as u8);
                    buf.extend_from_slice(change.delegate().as_bytes());
                }
                buf.extend_from_slice(h.previous.as_bytes());
                buf.extend_from_slice(&h.timestamp.as_secs().to_be_bytes());
            }
            Block::Delegate(b) => {
                let h = &b.hashables;
                buf.extend_from_slice(&h.balance.raw().to_be_bytes());
                buf.extend_from_slice(h.previous.as_bytes());
                buf.extend_from_slice(&h.share.basis_points().to_be_bytes());
                buf.extend_from_slice(&h.timestamp.as_secs().to_be_bytes());
            }
        }
        buf
    }

    /// Blake2b-256 of the digest.
    pub fn hash(&self) -> BlockHash {
        hash_block(&self.digest())
    }

    /// Resulting balance of the owning account after this block.
    pub fn balance(&self) -> Amount {
        match self {
            Block::Open(b) => b.hashables.balance,
            Block::Send(b) => b.hashables.balance,
            Block::Receive(b) => b.hashables.balance,
            Block::Change(b) => b.hashables.balance,
            Block::Delegate(b) => b.hashables.balance,
        }
    }

    /// Hash of the preceding block; zero for Open.
    pub fn previous(&self) -> BlockHash {
        match self {
            Block::Open(_) => BlockHash::ZERO,
            Block::Send(b) => b.hashables.previous,
            Block::Receive(b) => b.hashables.previous,
            Block::Change(b) => b.hashables.previous,
            Block::Delegate(b) => b.hashables.previous,
        }
    }

    /// The Send a Receive consumes. `None` for every other type and for
    /// reward credits.
    pub fn source(&self) -> Option<BlockHash> {
        match self {
            Block::Receive(b) if !b.hashables.source.is_zero() => Some(b.hashables.source),
            _ => None,
        }
    }

    pub fn destination(&self) -> Option<AccountId> {
        match self {
            Block::Send(b) => Some(b.hashables.destination),
            _ => None,
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        match self {
            Block::Open(b) => b.hashables.timestamp,
            Block::Send(b) => b.hashables.timestamp,
            Block::Receive(b) => b.hashables.timestamp,
            Block::Change(b) => b.hashables.timestamp,
            Block::Delegate(b) => b.hashables.timestamp,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Block::Open(_))
    }

    /// A Receive with no paired Send.
    pub fn is_reward(&self) -> bool {
        matches!(self, Block::Receive(b) if b.hashables.source.is_zero())
    }

    pub fn signatures(&self) -> &BlockSignatures {
        match self {
            Block::Open(b) => &b.signatures,
            Block::Send(b) => &b.signatures,
            Block::Receive(b) => &b.signatures,
            Block::Change(b) => &b.signatures,
            Block::Delegate(b) => &b.signatures,
        }
    }

    fn signatures_mut(&mut self) -> &mut BlockSignatures {
        match self {
            Block::Open(b) => &mut b.signatures,
            Block::Send(b) => &mut b.signatures,
            Block::Receive(b) => &mut b.signatures,
            Block::Change(b) => &mut b.signatures,
            Block::Delegate(b) => &mut b.signatures,
        }
    }

    /// Attach the owning account's signature.
    pub fn sign(&mut self, key: &PrivateKey) {
        let signature = sign_message(&self.digest(), key);
        self.signatures_mut().owner = Some(signature);
    }

    /// Attach the forger's witness signature.
    pub fn sign_witness(&mut self, key: &PrivateKey) {
        let signature = sign_message(&self.digest(), key);
        self.signatures_mut().witness = Some(signature);
    }

    /// True if the owner signature is present and verifies under `key`.
    pub fn verify(&self, key: &PublicKey) -> bool {
        self.signatures()
            .owner
            .as_ref()
            .is_some_and(|sig| verify_signature(&self.digest(), sig, key))
    }

    /// True if the witness signature is present and verifies under `key`.
    pub fn verify_witness(&self, key: &PublicKey) -> bool {
        self.signatures()
            .witness
            .as_ref()
            .is_some_and(|sig| verify_signature(&self.digest(), sig, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_crypto::keypair_from_seed;

    fn sample_send() -> Block {
        Block::send(
            Amount::from_units(70),
            AccountId::new([2u8; 32]),
            BlockHash::new([9u8; 32]),
            Timestamp::new(1_000),
        )
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(sample_send().hash(), sample_send().hash());
    }

    #[test]
    fn hash_covers_every_field() {
        let base = sample_send().hash();
        let other = Block::send(
            Amount::from_units(71),
            AccountId::new([2u8; 32]),
            BlockHash::new([9u8; 32]),
            Timestamp::new(1_000),
        );
        assert_ne!(base, other.hash());

        let later = Block::send(
            Amount::from_units(70),
            AccountId::new([2u8; 32]),
            BlockHash::new([9u8; 32]),
            Timestamp::new(1_001),
        );
        assert_ne!(base, later.hash());
    }

    #[test]
    fn type_tag_separates_variants() {
        let receive = Block::receive(
            Amount::from_units(70),
            BlockHash::new([9u8; 32]),
            BlockHash::ZERO,
            Timestamp::new(1_000),
        );
        let delegate = Block::delegate(
            Amount::from_units(70),
            BlockHash::new([9u8; 32]),
            RewardShare::NONE,
            Timestamp::new(1_000),
        );
        assert_ne!(receive.hash(), delegate.hash());
    }

    #[test]
    fn signatures_do_not_change_hash() {
        let owner = keypair_from_seed(&[1u8; 32]);
        let mut block = sample_send();
        let before = block.hash();
        block.sign(&owner.private);
        block.sign_witness(&owner.private);
        assert_eq!(block.hash(), before);
    }

    #[test]
    fn owner_and_witness_verify_independently() {
        let owner = keypair_from_seed(&[1u8; 32]);
        let forger = keypair_from_seed(&[2u8; 32]);
        let mut block = sample_send();
        assert!(!block.verify(&owner.public));

        block.sign(&owner.private);
        assert!(block.verify(&owner.public));
        assert!(!block.verify_witness(&forger.public));

        block.sign_witness(&forger.private);
        assert!(block.verify_witness(&forger.public));
        assert!(!block.verify(&forger.public));
    }

    #[test]
    fn tampering_breaks_signature() {
        let owner = keypair_from_seed(&[1u8; 32]);
        let mut block = sample_send();
        block.sign(&owner.private);
        if let Block::Send(send) = &mut block {
            send.hashables.balance = Amount::from_units(1_000);
        }
        assert!(!block.verify(&owner.public));
    }

    #[test]
    fn open_has_zero_previous() {
        let block = Block::open(AccountId::new([1u8; 32]), Amount::ZERO, Timestamp::EPOCH);
        assert!(block.is_open());
        assert!(block.previous().is_zero());
        assert_eq!(block.block_type(), BlockType::Open);
    }

    #[test]
    fn reward_receive_has_no_source() {
        let reward = Block::receive(
            Amount::from_units(4),
            BlockHash::new([1u8; 32]),
            BlockHash::ZERO,
            Timestamp::EPOCH,
        );
        assert!(reward.is_reward());
        assert_eq!(reward.source(), None);

        let paired = Block::receive(
            Amount::from_units(4),
            BlockHash::new([1u8; 32]),
            BlockHash::new([3u8; 32]),
            Timestamp::EPOCH,
        );
        assert!(!paired.is_reward());
        assert_eq!(paired.source(), Some(BlockHash::new([3u8; 32])));
    }

    #[test]
    fn change_digest_depends_on_vote_order() {
        let a = AccountId::new([1u8; 32]);
        let b = AccountId::new([2u8; 32]);
        let forward = Block::change(
            Amount::ZERO,
            vec![VoteChange::Add(a), VoteChange::Remove(b)],
            BlockHash::ZERO,
            Timestamp::EPOCH,
        );
        let swapped = Block::change(
            Amount::ZERO,
            vec![VoteChange::Add(b), VoteChange::Remove(a)],
            BlockHash::ZERO,
            Timestamp::EPOCH,
        );
        assert_ne!(forward.hash(), swapped.hash());
    }

    #[test]
    fn json_roundtrip_preserves_hash() {
        let owner = keypair_from_seed(&[1u8; 32]);
        let mut block = sample_send();
        block.sign(&owner.private);
        let json = serde_json::to_string(&block).unwrap();
        let restored: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.hash(), block.hash());
        assert!(restored.verify(&owner.public));
    }
}
