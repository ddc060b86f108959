//! The in-memory ledger: accounts, their chains, and the username directory.
//!
//! The ledger enforces the structural invariants on its own: hash-chain
//! integrity, exactly one Open at the head of every chain, and 1:1 Send to
//! Receive linkage. Consensus-level rules (who may witness, which fees apply)
//! are checked upstream before a block ever reaches [`Ledger::append_block`].

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, error};
use vigil_types::{AccountId, Amount, BlockHash, ProtocolParams, RewardShare, Timestamp, VoteChange};

use crate::account::Account;
use crate::account_chain::AccountChain;
use crate::block::Block;
use crate::blueprint::{Blueprint, BlueprintPayload};
use crate::error::LedgerError;
use crate::snapshot::{AccountSnapshot, LedgerSnapshot};

/// Where a block lives.
#[derive(Clone, Copy, Debug)]
struct BlockLocation {
    account: AccountId,
    height: usize,
}

#[derive(Debug, Default)]
pub struct Ledger {
    accounts: BTreeMap<AccountId, Account>,
    chains: HashMap<AccountId, AccountChain>,
    usernames: BTreeMap<String, AccountId>,
    names: HashMap<AccountId, String>,
    index: HashMap<BlockHash, BlockLocation>,
    /// Send hash → hash of the Receive that consumed it.
    received: HashMap<BlockHash, BlockHash>,
}

/// Summary statistics for the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerSummary {
    pub accounts: u64,
    pub opened: u64,
    pub blocks: u64,
    pub delegates: u64,
    pub received_sends: u64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Accounts ─────────────────────────────────────────────────────────

    /// Register an account under a username. Usernames are case-insensitive
    /// and unique.
    pub fn insert_account(
        &mut self,
        account: Account,
        username: &str,
    ) -> Result<AccountId, LedgerError> {
        let username = username.trim().to_lowercase();
        if username.is_empty() {
            return Err(LedgerError::InvalidUsername(username));
        }
        if self.usernames.contains_key(&username) {
            return Err(LedgerError::UsernameTaken(username));
        }
        let id = account.id();
        if self.accounts.contains_key(&id) {
            return Err(LedgerError::AccountExists(id));
        }
        self.usernames.insert(username.clone(), id);
        self.names.insert(id, username);
        self.accounts.insert(id, account);
        Ok(id)
    }

    /// Undo [`insert_account`](Self::insert_account) for an account whose
    /// Open block never made it into the ledger.
    pub fn remove_unopened_account(&mut self, id: &AccountId) -> Result<Account, LedgerError> {
        if self.chains.contains_key(id) {
            return Err(LedgerError::AccountInUse(*id));
        }
        let account = self
            .accounts
            .remove(id)
            .ok_or(LedgerError::AccountNotFound(*id))?;
        if let Some(name) = self.names.remove(id) {
            self.usernames.remove(&name);
        }
        Ok(account)
    }

    pub fn account(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.get(id)
    }

    pub fn account_mut(&mut self, id: &AccountId) -> Option<&mut Account> {
        self.accounts.get_mut(id)
    }

    /// All accounts in ascending id order.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn account_by_username(&self, username: &str) -> Option<&Account> {
        let id = self.usernames.get(&username.to_lowercase())?;
        self.accounts.get(id)
    }

    pub fn username(&self, id: &AccountId) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn is_opened(&self, id: &AccountId) -> bool {
        self.chains.contains_key(id)
    }

    // ── Chains and blocks ────────────────────────────────────────────────

    pub fn latest_block(&self, id: &AccountId) -> Option<&Block> {
        self.chains.get(id).and_then(AccountChain::latest)
    }

    pub fn chain(&self, id: &AccountId) -> Option<&AccountChain> {
        self.chains.get(id)
    }

    pub fn chains(&self) -> impl Iterator<Item = &AccountChain> {
        self.chains.values()
    }

    pub fn block(&self, hash: &BlockHash) -> Option<&Block> {
        let location = self.index.get(hash)?;
        self.chains.get(&location.account)?.get(location.height)
    }

    /// Owner of the chain `hash` belongs to.
    pub fn block_account(&self, hash: &BlockHash) -> Option<AccountId> {
        self.index.get(hash).map(|location| location.account)
    }

    /// Whether the Send `hash` has been consumed by a Receive.
    pub fn is_received(&self, send: &BlockHash) -> bool {
        self.received.contains_key(send)
    }

    /// Value a Send moved to its destination: the sender's previous balance
    /// minus the Send's resulting balance, less the transaction fee.
    pub fn sent_amount(&self, send: &BlockHash, params: &ProtocolParams) -> Option<Amount> {
        let block = self.block(send)?;
        block.destination()?;
        let prev = self.block(&block.previous())?;
        prev.balance()
            .checked_sub(block.balance())?
            .checked_sub(params.transaction_fee)
    }

    /// Check a blueprint against the current ledger state before forging.
    ///
    /// The blueprint must extend the account's current tip, and its resulting
    /// balance must be the tip balance adjusted by its own operation and
    /// fees. A Send must target an opened account. A paired Receive must
    /// consume an unreceived Send addressed to this account for exactly the
    /// sent amount. A Change may only add registered delegates and must stay
    /// within both vote limits. A Delegate must not re-register. Reward
    /// credits are refused here; see [`check_reward_credit`](Self::check_reward_credit).
    pub fn check_blueprint(
        &self,
        id: &AccountId,
        blueprint: &Blueprint,
        params: &ProtocolParams,
    ) -> Result<(), LedgerError> {
        if let BlueprintPayload::Receive { source: None } = blueprint.payload {
            return Err(LedgerError::RewardNotAllowed);
        }
        let tip = self.check_extends_tip(id, blueprint)?;

        match &blueprint.payload {
            BlueprintPayload::Send { destination } => {
                if !self.accounts.contains_key(destination) {
                    return Err(LedgerError::UnknownDestination(*destination));
                }
                if !self.is_opened(destination) {
                    return Err(LedgerError::NotOpened(*destination));
                }
            }
            BlueprintPayload::Receive {
                source: Some(source),
            } => {
                self.check_source(id, source)?;
                let expected = self
                    .sent_amount(source, params)
                    .ok_or(LedgerError::SourceNotFound(*source))?;
                if expected != blueprint.amount {
                    return Err(LedgerError::AmountMismatch {
                        expected,
                        actual: blueprint.amount,
                    });
                }
            }
            BlueprintPayload::Change { changes } => self.check_vote_changes(id, changes, params)?,
            BlueprintPayload::Delegate { share } => {
                if self.accounts.get(id).is_some_and(|account| account.is_delegate) {
                    return Err(LedgerError::AlreadyDelegate(*id));
                }
                if share.basis_points() > RewardShare::MAX_BASIS_POINTS {
                    return Err(LedgerError::InvalidBlock {
                        reason: format!("reward share {share} exceeds 100%"),
                    });
                }
            }
            BlueprintPayload::Open | BlueprintPayload::Receive { source: None } => {}
        }
        check_balance(tip, blueprint, params)
    }

    /// Check a protocol reward credit: a sourceless Receive on an opened
    /// chain that adds exactly its amount to the tip balance.
    pub fn check_reward_credit(
        &self,
        id: &AccountId,
        blueprint: &Blueprint,
    ) -> Result<(), LedgerError> {
        if blueprint.payload != (BlueprintPayload::Receive { source: None }) {
            return Err(LedgerError::InvalidBlock {
                reason: format!("{} blueprint is not a reward credit", blueprint.block_type()),
            });
        }
        let available = self
            .check_extends_tip(id, blueprint)?
            .ok_or(LedgerError::NotOpened(*id))?;
        let expected = available
            .checked_add(blueprint.amount)
            .ok_or(LedgerError::BalanceOverflow)?;
        if blueprint.balance != expected {
            return Err(LedgerError::BalanceMismatch {
                expected,
                actual: blueprint.balance,
            });
        }
        Ok(())
    }

    /// Verify `blueprint.previous` is the account's head and return the head
    /// balance, or `None` for an unopened chain.
    fn check_extends_tip(
        &self,
        id: &AccountId,
        blueprint: &Blueprint,
    ) -> Result<Option<Amount>, LedgerError> {
        if !self.accounts.contains_key(id) {
            return Err(LedgerError::AccountNotFound(*id));
        }
        let tip = self.latest_block(id);
        match (blueprint.previous, tip) {
            (None, Some(_)) => Err(LedgerError::AlreadyOpened(*id)),
            (Some(_), None) => Err(LedgerError::NotOpened(*id)),
            (Some(previous), Some(head)) if previous != head.hash() => Err(LedgerError::BlockGap {
                expected: head.hash(),
                found: previous,
            }),
            _ => Ok(tip.map(Block::balance)),
        }
    }

    fn check_vote_changes(
        &self,
        id: &AccountId,
        changes: &[VoteChange],
        params: &ProtocolParams,
    ) -> Result<(), LedgerError> {
        if changes.len() > params.max_delegates_per_block {
            return Err(LedgerError::TooManyChanges {
                count: changes.len(),
                max: params.max_delegates_per_block,
            });
        }
        let mut voted = self
            .accounts
            .get(id)
            .map(|account| account.voted_delegates.clone())
            .unwrap_or_default();
        for change in changes {
            match change {
                VoteChange::Add(delegate) => {
                    if !self.accounts.get(delegate).is_some_and(|d| d.is_delegate) {
                        return Err(LedgerError::NotADelegate(*delegate));
                    }
                    voted.insert(*delegate);
                }
                VoteChange::Remove(delegate) => {
                    voted.remove(delegate);
                }
            }
        }
        if voted.len() > params.max_delegates_per_account {
            return Err(LedgerError::TooManyDelegates {
                count: voted.len(),
                max: params.max_delegates_per_account,
            });
        }
        Ok(())
    }

    fn check_source(&self, id: &AccountId, source: &BlockHash) -> Result<(), LedgerError> {
        let block = self
            .block(source)
            .ok_or(LedgerError::SourceNotFound(*source))?;
        match block.destination() {
            None => Err(LedgerError::SourceNotASend(*source)),
            Some(destination) if destination != *id => {
                Err(LedgerError::SourceWrongDestination(*source))
            }
            Some(_) if self.is_received(source) => Err(LedgerError::DuplicateSource(*source)),
            Some(_) => Ok(()),
        }
    }

    /// Append a block to an account's chain.
    ///
    /// Signatures are not checked here; the caller verifies owner and
    /// witness before appending.
    pub fn append_block(&mut self, id: &AccountId, block: Block) -> Result<BlockHash, LedgerError> {
        if !self.accounts.contains_key(id) {
            return Err(LedgerError::AccountNotFound(*id));
        }
        match self.chains.get(id) {
            Some(chain) => chain.validate_append(&block)?,
            None => AccountChain::new(*id).validate_append(&block)?,
        }
        if let Some(source) = block.source() {
            self.check_source(id, &source)?;
        }

        let hash = block.hash();
        if self.index.contains_key(&hash) {
            error!(%hash, account = %id, "duplicate block hash rejected");
            return Err(LedgerError::DuplicateBlock(hash));
        }

        if let Some(source) = block.source() {
            self.received.insert(source, hash);
        }
        let chain = self
            .chains
            .entry(*id)
            .or_insert_with(|| AccountChain::new(*id));
        let height = chain.blocks().len();
        debug!(%hash, account = %id, block_type = %block.block_type(), height, "block appended");
        chain.append(block, hash);
        self.index.insert(hash, BlockLocation { account: *id, height });
        Ok(hash)
    }

    /// Remove the head block of an account's chain.
    ///
    /// Only the tip can be rolled back, and a Send that has already been
    /// received stays put. Rolling back an Open leaves the account unopened.
    pub fn rollback(&mut self, id: &AccountId, hash: &BlockHash) -> Result<Block, LedgerError> {
        let chain = self
            .chains
            .get_mut(id)
            .ok_or(LedgerError::NotOpened(*id))?;
        if chain.head != *hash {
            if self.index.contains_key(hash) {
                return Err(LedgerError::NotChainTip(*hash));
            }
            return Err(LedgerError::BlockNotFound(*hash));
        }
        if self.received.contains_key(hash) {
            return Err(LedgerError::SendAlreadyReceived(*hash));
        }

        let block = chain.pop().ok_or(LedgerError::BlockNotFound(*hash))?;
        if chain.is_empty() {
            self.chains.remove(id);
        }
        self.index.remove(hash);
        if let Some(source) = block.source() {
            self.received.remove(&source);
        }
        debug!(%hash, account = %id, block_type = %block.block_type(), "block rolled back");
        Ok(block)
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// Opened accounts voting for `delegate`, in ascending id order.
    pub fn stakeholders(&self, delegate: &AccountId) -> Vec<AccountId> {
        self.accounts
            .values()
            .filter(|account| account.votes_for(delegate) && self.is_opened(&account.id()))
            .map(Account::id)
            .collect()
    }

    /// Sum of every chain tip balance.
    pub fn total_balance(&self) -> Amount {
        self.chains
            .values()
            .filter_map(AccountChain::latest)
            .fold(Amount::ZERO, |total, block| total.saturating_add(block.balance()))
    }

    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary {
            accounts: self.accounts.len() as u64,
            opened: self.chains.len() as u64,
            blocks: self.index.len() as u64,
            delegates: self.accounts.values().filter(|a| a.is_delegate).count() as u64,
            received_sends: self.received.len() as u64,
        }
    }

    /// Capture every account's state.
    pub fn snapshot(&self, created_at: Timestamp) -> LedgerSnapshot {
        let accounts = self
            .accounts
            .values()
            .map(|account| {
                let id = account.id();
                let chain = self.chains.get(&id);
                AccountSnapshot {
                    id,
                    username: self.names.get(&id).cloned().unwrap_or_default(),
                    head: chain.map_or(BlockHash::ZERO, |c| c.head),
                    block_count: chain.map_or(0, AccountChain::block_count),
                    balance: self
                        .latest_block(&id)
                        .map_or(Amount::ZERO, Block::balance),
                    is_delegate: account.is_delegate,
                    reward_share: account.reward_share,
                    voted_delegates: account.voted_delegates.iter().copied().collect(),
                    forged_count: account.forged_count,
                    missed_count: account.missed_count,
                }
            })
            .collect();
        LedgerSnapshot::create(accounts, self.index.len() as u64, created_at)
    }
}

/// The balance a blueprint must carry: the tip balance adjusted by the
/// block's own operation and fees.
///
/// A blueprint whose shape does not fit the chain (an Open after the head, or
/// anything but an Open on an unopened chain) is left to the forging round,
/// which reports it as an invalid block type.
fn check_balance(
    tip: Option<Amount>,
    blueprint: &Blueprint,
    params: &ProtocolParams,
) -> Result<(), LedgerError> {
    let is_open = blueprint.payload == BlueprintPayload::Open;
    if is_open != blueprint.previous.is_none() {
        return Ok(());
    }
    let available = tip.unwrap_or(Amount::ZERO);
    let debit = |needed: Amount| {
        available
            .checked_sub(needed)
            .ok_or(LedgerError::InsufficientFunds { needed, available })
    };
    let expected = match &blueprint.payload {
        BlueprintPayload::Open => Amount::ZERO,
        BlueprintPayload::Send { .. } => debit(
            blueprint
                .amount
                .checked_add(params.transaction_fee)
                .ok_or(LedgerError::BalanceOverflow)?,
        )?,
        BlueprintPayload::Receive { .. } => available
            .checked_add(blueprint.amount)
            .ok_or(LedgerError::BalanceOverflow)?,
        BlueprintPayload::Change { .. } => debit(params.change_cost())?,
        BlueprintPayload::Delegate { .. } => debit(params.delegate_cost())?,
    };
    let moves_value = matches!(
        blueprint.payload,
        BlueprintPayload::Send { .. } | BlueprintPayload::Receive { .. }
    );
    if !moves_value && !blueprint.amount.is_zero() {
        return Err(LedgerError::InvalidBlock {
            reason: format!("{} blueprint carries an amount", blueprint.block_type()),
        });
    }
    if blueprint.balance != expected {
        return Err(LedgerError::BalanceMismatch {
            expected,
            actual: blueprint.balance,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_crypto::keypair_from_seed;
    use vigil_types::{Timestamp, VoteChange};

    fn account(seed: u8) -> Account {
        Account::new(keypair_from_seed(&[seed; 32]))
    }

    /// Insert and open an account with `units` directly, bypassing forging.
    fn opened(ledger: &mut Ledger, seed: u8, name: &str, units: u128) -> AccountId {
        let id = ledger.insert_account(account(seed), name).unwrap();
        let block = Block::open(id, Amount::from_units(units), Timestamp::new(seed as u64));
        ledger.append_block(&id, block).unwrap();
        id
    }

    fn send(ledger: &mut Ledger, from: &AccountId, to: AccountId, balance: Amount) -> BlockHash {
        let prev = ledger.chain(from).unwrap().head;
        let block = Block::send(balance, to, prev, Timestamp::new(10));
        ledger.append_block(from, block).unwrap()
    }

    #[test]
    fn usernames_are_case_insensitive_and_unique() {
        let mut ledger = Ledger::new();
        let id = ledger.insert_account(account(1), "Alice").unwrap();
        assert_eq!(ledger.username(&id), Some("alice"));
        assert_eq!(ledger.account_by_username("ALICE").unwrap().id(), id);
        assert_eq!(
            ledger.insert_account(account(2), "alice").unwrap_err(),
            LedgerError::UsernameTaken("alice".into())
        );
        assert!(matches!(
            ledger.insert_account(account(3), "  "),
            Err(LedgerError::InvalidUsername(_))
        ));
    }

    #[test]
    fn remove_unopened_only() {
        let mut ledger = Ledger::new();
        let pending = ledger.insert_account(account(1), "pending").unwrap();
        let open = opened(&mut ledger, 2, "open", 0);

        ledger.remove_unopened_account(&pending).unwrap();
        assert!(ledger.account(&pending).is_none());
        assert!(ledger.account_by_username("pending").is_none());
        assert_eq!(
            ledger.remove_unopened_account(&open).unwrap_err(),
            LedgerError::AccountInUse(open)
        );
    }

    #[test]
    fn receive_consumes_send_once() {
        let mut ledger = Ledger::new();
        let alice = opened(&mut ledger, 1, "alice", 100);
        let bob = opened(&mut ledger, 2, "bob", 0);
        let send_hash = send(&mut ledger, &alice, bob, Amount::new(69_900_000));

        let bob_head = ledger.chain(&bob).unwrap().head;
        let receive = Block::receive(Amount::from_units(30), bob_head, send_hash, Timestamp::new(11));
        let receive_hash = ledger.append_block(&bob, receive).unwrap();
        assert!(ledger.is_received(&send_hash));

        let again = Block::receive(Amount::from_units(60), receive_hash, send_hash, Timestamp::new(12));
        assert_eq!(
            ledger.append_block(&bob, again).unwrap_err(),
            LedgerError::DuplicateSource(send_hash)
        );
    }

    #[test]
    fn receive_must_target_destination() {
        let mut ledger = Ledger::new();
        let alice = opened(&mut ledger, 1, "alice", 100);
        let bob = opened(&mut ledger, 2, "bob", 0);
        let carol = opened(&mut ledger, 3, "carol", 0);
        let send_hash = send(&mut ledger, &alice, bob, Amount::new(69_900_000));

        let carol_head = ledger.chain(&carol).unwrap().head;
        let theft = Block::receive(Amount::from_units(30), carol_head, send_hash, Timestamp::new(11));
        assert_eq!(
            ledger.append_block(&carol, theft).unwrap_err(),
            LedgerError::SourceWrongDestination(send_hash)
        );
    }

    #[test]
    fn check_blueprint_validates_against_state() {
        let params = ProtocolParams::default();
        let mut ledger = Ledger::new();
        let alice = opened(&mut ledger, 1, "alice", 100);
        let bob = opened(&mut ledger, 2, "bob", 0);
        let unopened = ledger.insert_account(account(3), "carol").unwrap();
        let send_hash = send(&mut ledger, &alice, bob, Amount::new(69_900_000));
        assert_eq!(ledger.sent_amount(&send_hash, &params), Some(Amount::from_units(30)));

        let bob_head = Some(ledger.chain(&bob).unwrap().head);
        let receive = |amount: Amount| Blueprint {
            previous: bob_head,
            balance: amount,
            amount,
            payload: BlueprintPayload::Receive {
                source: Some(send_hash),
            },
        };
        ledger
            .check_blueprint(&bob, &receive(Amount::from_units(30)), &params)
            .unwrap();
        assert!(matches!(
            ledger.check_blueprint(&bob, &receive(Amount::from_units(31)), &params),
            Err(LedgerError::AmountMismatch { .. })
        ));

        let stale = Blueprint {
            previous: Some(BlockHash::new([5u8; 32])),
            balance: Amount::ZERO,
            amount: Amount::ZERO,
            payload: BlueprintPayload::Send { destination: bob },
        };
        assert!(matches!(
            ledger.check_blueprint(&alice, &stale, &params),
            Err(LedgerError::BlockGap { .. })
        ));

        let to_unopened = Blueprint {
            previous: Some(ledger.chain(&alice).unwrap().head),
            balance: Amount::ZERO,
            amount: Amount::ZERO,
            payload: BlueprintPayload::Send {
                destination: unopened,
            },
        };
        assert_eq!(
            ledger.check_blueprint(&alice, &to_unopened, &params).unwrap_err(),
            LedgerError::NotOpened(unopened)
        );

        let reopen = Blueprint {
            previous: None,
            balance: Amount::ZERO,
            amount: Amount::ZERO,
            payload: BlueprintPayload::Open,
        };
        assert_eq!(
            ledger.check_blueprint(&alice, &reopen, &params).unwrap_err(),
            LedgerError::AlreadyOpened(alice)
        );
    }

    fn blueprint(
        previous: Option<BlockHash>,
        balance: Amount,
        amount: Amount,
        payload: BlueprintPayload,
    ) -> Blueprint {
        Blueprint {
            previous,
            balance,
            amount,
            payload,
        }
    }

    #[test]
    fn check_blueprint_enforces_resulting_balance() {
        let params = ProtocolParams::default();
        let mut ledger = Ledger::new();
        let alice = opened(&mut ledger, 1, "alice", 100);
        let bob = opened(&mut ledger, 2, "bob", 0);
        let head = Some(ledger.chain(&alice).unwrap().head);
        let send = |balance: Amount, amount: Amount| {
            blueprint(head, balance, amount, BlueprintPayload::Send { destination: bob })
        };

        ledger
            .check_blueprint(&alice, &send(Amount::new(69_900_000), Amount::from_units(30)), &params)
            .unwrap();
        assert_eq!(
            ledger
                .check_blueprint(&alice, &send(Amount::from_units(100), Amount::from_units(30)), &params)
                .unwrap_err(),
            LedgerError::BalanceMismatch {
                expected: Amount::new(69_900_000),
                actual: Amount::from_units(100),
            }
        );
        assert_eq!(
            ledger
                .check_blueprint(&alice, &send(Amount::ZERO, Amount::from_units(200)), &params)
                .unwrap_err(),
            LedgerError::InsufficientFunds {
                needed: Amount::new(200_100_000),
                available: Amount::from_units(100),
            }
        );

        let free_change = blueprint(
            head,
            Amount::from_units(100),
            Amount::ZERO,
            BlueprintPayload::Change { changes: Vec::new() },
        );
        assert_eq!(
            ledger.check_blueprint(&alice, &free_change, &params).unwrap_err(),
            LedgerError::BalanceMismatch {
                expected: Amount::new(98_900_000),
                actual: Amount::from_units(100),
            }
        );

        let free_delegate = blueprint(
            head,
            Amount::from_units(100),
            Amount::ZERO,
            BlueprintPayload::Delegate {
                share: RewardShare::FULL,
            },
        );
        assert_eq!(
            ledger.check_blueprint(&alice, &free_delegate, &params).unwrap_err(),
            LedgerError::BalanceMismatch {
                expected: Amount::new(74_900_000),
                actual: Amount::from_units(100),
            }
        );

        let priced_change = blueprint(
            head,
            Amount::new(98_900_000),
            Amount::from_units(1),
            BlueprintPayload::Change { changes: Vec::new() },
        );
        assert!(matches!(
            ledger.check_blueprint(&alice, &priced_change, &params),
            Err(LedgerError::InvalidBlock { .. })
        ));
    }

    #[test]
    fn check_blueprint_guards_votes_and_registration() {
        let params = ProtocolParams {
            max_delegates_per_account: 1,
            ..ProtocolParams::default()
        };
        let mut ledger = Ledger::new();
        let alice = opened(&mut ledger, 1, "alice", 100);
        let bob = opened(&mut ledger, 2, "bob", 0);
        let carol = opened(&mut ledger, 3, "carol", 0);
        let head = Some(ledger.chain(&alice).unwrap().head);
        let change = |changes: Vec<VoteChange>| {
            blueprint(
                head,
                Amount::new(98_900_000),
                Amount::ZERO,
                BlueprintPayload::Change { changes },
            )
        };

        assert_eq!(
            ledger
                .check_blueprint(&alice, &change(vec![VoteChange::Add(bob)]), &params)
                .unwrap_err(),
            LedgerError::NotADelegate(bob)
        );

        ledger.account_mut(&bob).unwrap().is_delegate = true;
        ledger.account_mut(&carol).unwrap().is_delegate = true;
        ledger
            .check_blueprint(&alice, &change(vec![VoteChange::Add(bob)]), &params)
            .unwrap();
        assert_eq!(
            ledger
                .check_blueprint(
                    &alice,
                    &change(vec![VoteChange::Add(bob), VoteChange::Add(carol)]),
                    &params
                )
                .unwrap_err(),
            LedgerError::TooManyDelegates { count: 2, max: 1 }
        );

        let oversized = (0..34u8).map(|i| VoteChange::Remove(AccountId::new([i; 32]))).collect();
        assert_eq!(
            ledger.check_blueprint(&alice, &change(oversized), &params).unwrap_err(),
            LedgerError::TooManyChanges { count: 34, max: 33 }
        );

        let register = blueprint(
            head,
            Amount::new(74_900_000),
            Amount::ZERO,
            BlueprintPayload::Delegate {
                share: RewardShare::NONE,
            },
        );
        ledger.check_blueprint(&alice, &register, &params).unwrap();
        ledger.account_mut(&alice).unwrap().is_delegate = true;
        assert_eq!(
            ledger.check_blueprint(&alice, &register, &params).unwrap_err(),
            LedgerError::AlreadyDelegate(alice)
        );
    }

    #[test]
    fn reward_credits_have_their_own_check() {
        let params = ProtocolParams::default();
        let mut ledger = Ledger::new();
        let alice = opened(&mut ledger, 1, "alice", 100);
        let unopened = ledger.insert_account(account(2), "bob").unwrap();
        let head = Some(ledger.chain(&alice).unwrap().head);
        let reward = |balance: Amount| {
            blueprint(
                head,
                balance,
                Amount::from_units(5),
                BlueprintPayload::Receive { source: None },
            )
        };

        assert_eq!(
            ledger
                .check_blueprint(&alice, &reward(Amount::from_units(105)), &params)
                .unwrap_err(),
            LedgerError::RewardNotAllowed
        );
        ledger
            .check_reward_credit(&alice, &reward(Amount::from_units(105)))
            .unwrap();
        assert!(matches!(
            ledger.check_reward_credit(&alice, &reward(Amount::from_units(1_000_000))),
            Err(LedgerError::BalanceMismatch { .. })
        ));
        assert!(matches!(
            ledger.check_reward_credit(
                &alice,
                &blueprint(
                    head,
                    Amount::new(98_900_000),
                    Amount::ZERO,
                    BlueprintPayload::Change { changes: Vec::new() }
                )
            ),
            Err(LedgerError::InvalidBlock { .. })
        ));
        let orphan = blueprint(
            None,
            Amount::from_units(5),
            Amount::from_units(5),
            BlueprintPayload::Receive { source: None },
        );
        assert_eq!(
            ledger.check_reward_credit(&unopened, &orphan).unwrap_err(),
            LedgerError::NotOpened(unopened)
        );
    }

    #[test]
    fn rollback_tip_only() {
        let mut ledger = Ledger::new();
        let alice = opened(&mut ledger, 1, "alice", 100);
        let bob = opened(&mut ledger, 2, "bob", 0);
        let open_hash = ledger.chain(&alice).unwrap().head;
        let send_hash = send(&mut ledger, &alice, bob, Amount::new(69_900_000));

        assert_eq!(
            ledger.rollback(&alice, &open_hash).unwrap_err(),
            LedgerError::NotChainTip(open_hash)
        );

        let removed = ledger.rollback(&alice, &send_hash).unwrap();
        assert_eq!(removed.hash(), send_hash);
        assert_eq!(ledger.chain(&alice).unwrap().head, open_hash);
        assert!(ledger.block(&send_hash).is_none());
    }

    #[test]
    fn received_send_cannot_be_rolled_back() {
        let mut ledger = Ledger::new();
        let alice = opened(&mut ledger, 1, "alice", 100);
        let bob = opened(&mut ledger, 2, "bob", 0);
        let send_hash = send(&mut ledger, &alice, bob, Amount::new(69_900_000));
        let bob_head = ledger.chain(&bob).unwrap().head;
        let receive = Block::receive(Amount::from_units(30), bob_head, send_hash, Timestamp::new(11));
        let receive_hash = ledger.append_block(&bob, receive).unwrap();

        assert_eq!(
            ledger.rollback(&alice, &send_hash).unwrap_err(),
            LedgerError::SendAlreadyReceived(send_hash)
        );

        ledger.rollback(&bob, &receive_hash).unwrap();
        assert!(!ledger.is_received(&send_hash));
        ledger.rollback(&alice, &send_hash).unwrap();
    }

    #[test]
    fn stakeholders_in_id_order() {
        let mut ledger = Ledger::new();
        let delegate = opened(&mut ledger, 1, "delegate", 10);
        let mut voters: Vec<AccountId> = (2..6u8)
            .map(|seed| opened(&mut ledger, seed, &format!("voter{seed}"), 1))
            .collect();
        let bystander = opened(&mut ledger, 9, "bystander", 1);
        for voter in &voters {
            ledger
                .account_mut(voter)
                .unwrap()
                .apply_vote_changes(&[VoteChange::Add(delegate)]);
        }
        // Unopened voters hold no stake.
        let ghost = ledger.insert_account(account(7), "ghost").unwrap();
        ledger
            .account_mut(&ghost)
            .unwrap()
            .apply_vote_changes(&[VoteChange::Add(delegate)]);

        voters.sort();
        assert_eq!(ledger.stakeholders(&delegate), voters);
        assert!(!ledger.stakeholders(&delegate).contains(&bystander));
    }

    #[test]
    fn summary_and_snapshot_reflect_state() {
        let mut ledger = Ledger::new();
        let alice = opened(&mut ledger, 1, "alice", 100);
        let bob = opened(&mut ledger, 2, "bob", 0);
        send(&mut ledger, &alice, bob, Amount::new(69_900_000));

        let summary = ledger.summary();
        assert_eq!(summary.accounts, 2);
        assert_eq!(summary.opened, 2);
        assert_eq!(summary.blocks, 3);
        assert_eq!(ledger.total_balance(), Amount::new(69_900_000));

        let snapshot = ledger.snapshot(Timestamp::new(99));
        assert!(snapshot.verify());
        let alice_row = snapshot.accounts.iter().find(|a| a.id == alice).unwrap();
        assert_eq!(alice_row.username, "alice");
        assert_eq!(alice_row.block_count, 2);
        assert_eq!(alice_row.balance, Amount::new(69_900_000));
    }

    #[test]
    fn every_chain_keeps_integrity() {
        let mut ledger = Ledger::new();
        let alice = opened(&mut ledger, 1, "alice", 100);
        let bob = opened(&mut ledger, 2, "bob", 0);
        send(&mut ledger, &alice, bob, Amount::new(50_000_000));
        send(&mut ledger, &alice, bob, Amount::new(20_000_000));
        assert!(ledger.chains().all(AccountChain::verify_integrity));
    }
}
