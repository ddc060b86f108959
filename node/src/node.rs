//! The node: one ledger, one DPoS state, and the pipeline that turns
//! requests into witnessed blocks.
//!
//! Every request is processed to completion before the next one starts. A
//! Send is settled by its paired Receive within the same call, or rolled
//! back. Reward payouts then run as an explicit stack of credit tasks, so
//! the ledger never observes a half-applied transfer.

use std::time::Instant;

use tracing::{debug, error, info, warn};
use vigil_crypto::generate_keypair;
use vigil_consensus::{check_max_delegate_limit, plan_vote_chunk, vote_chunks, ConsensusError, Dpos};
use vigil_ledger::{
    Account, Block, BlockType, BlueprintPayload, Ledger, LedgerError, LedgerSnapshot, LedgerSummary,
};
use vigil_types::{AccountId, Amount, BlockHash, Clock, KeyPair, ProtocolParams, SystemClock};

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::metrics::NodeMetrics;
use crate::payout::split_reward;
use crate::request::{PayoutCredit, PayoutReport, PayoutWarning, ProcessOutcome, Request};
use crate::tracing_spans::{election_span, payout_span, process_span};

/// A block that made it onto the ledger.
#[derive(Clone, Copy, Debug)]
struct Forged {
    hash: BlockHash,
    block_type: BlockType,
    forger: AccountId,
    reward: Amount,
}

/// Who a blueprint comes from, which decides how it is checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Origin {
    /// A caller's request, or the Receive that settles it.
    Request,
    /// A reward credit minted by a payout.
    Payout,
}

/// Payout work spawned by a forged block.
#[derive(Debug)]
enum Task {
    /// Split a forge reward between the forger and its stakeholders.
    Payout { forger: AccountId, reward: Amount },
    /// Append one reward credit.
    Credit { account: AccountId, amount: Amount },
}

pub struct Node {
    params: ProtocolParams,
    ledger: Ledger,
    dpos: Dpos,
    clock: Box<dyn Clock + Send>,
    metrics: NodeMetrics,
}

impl Node {
    pub fn new(params: ProtocolParams, clock: Box<dyn Clock + Send>) -> Result<Self, NodeError> {
        Ok(Self {
            params,
            ledger: Ledger::new(),
            dpos: Dpos::new(),
            clock,
            metrics: NodeMetrics::new()?,
        })
    }

    pub fn from_config(config: &NodeConfig) -> Result<Self, NodeError> {
        Self::new(config.params.clone(), Box::new(SystemClock))
    }

    pub fn params(&self) -> &ProtocolParams {
        &self.params
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn dpos(&self) -> &Dpos {
        &self.dpos
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }

    pub fn summary(&self) -> LedgerSummary {
        self.ledger.summary()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.ledger.snapshot(self.clock.now())
    }

    // ── Pipeline ─────────────────────────────────────────────────────────

    /// Forge, sign, verify and append the requested block, then run its
    /// side effects: the paired Receive for a Send and the reward payout.
    pub fn process(&mut self, request: Request) -> Result<ProcessOutcome, NodeError> {
        let span = process_span(&request.account, request.blueprint.block_type());
        let _enter = span.enter();
        let started = Instant::now();

        let result = self.process_inner(request);
        self.metrics
            .process_time_ms
            .observe(started.elapsed().as_secs_f64() * 1_000.0);
        self.metrics.observe_ledger(&self.ledger.summary());
        match &result {
            Ok(_) => self.metrics.requests_processed.inc(),
            Err(e) => {
                self.metrics.requests_rejected.inc();
                debug!(error = %e, "request rejected");
            }
        }
        result
    }

    fn process_inner(&mut self, request: Request) -> Result<ProcessOutcome, NodeError> {
        let forged = self.forge_and_append(&request, Origin::Request)?;

        // The transfer settles before anyone is paid for it.
        let paired_receive = match request.blueprint.payload {
            BlueprintPayload::Send { destination } => Some(self.settle(
                forged.hash,
                request.account,
                destination,
                request.blueprint.amount,
            )?),
            _ => None,
        };
        self.record_forged(&forged);

        let mut report = PayoutReport::default();
        if !forged.reward.is_zero() {
            self.run_payouts(
                vec![Task::Payout {
                    forger: forged.forger,
                    reward: forged.reward,
                }],
                &mut report,
            );
        }

        Ok(ProcessOutcome {
            hash: forged.hash,
            block_type: forged.block_type,
            forger: forged.forger,
            reward: forged.reward,
            paired_receive,
            credits: report.credits,
            warnings: report.warnings,
        })
    }

    /// Forge the Receive that consumes `send`. If it cannot be forged the
    /// Send is rolled back and the error returned.
    fn settle(
        &mut self,
        send: BlockHash,
        sender: AccountId,
        destination: AccountId,
        amount: Amount,
    ) -> Result<BlockHash, NodeError> {
        match self.pair_receive(send, sender, destination, amount) {
            Ok(receive) => {
                self.record_forged(&receive);
                Ok(receive.hash)
            }
            Err(e) => {
                error!(%send, error = %e, "paired receive failed, rolling back send");
                self.ledger.rollback(&sender, &send)?;
                Err(e)
            }
        }
    }

    /// Credit the forger of a committed block.
    fn record_forged(&mut self, forged: &Forged) {
        if let Some(delegate) = self.ledger.account_mut(&forged.forger) {
            delegate.forged_count += 1;
        }
        self.metrics.blocks_forged.inc();
    }

    /// Drain payout and credit tasks. Failures become warnings in `report`.
    fn run_payouts(&mut self, mut tasks: Vec<Task>, report: &mut PayoutReport) {
        while let Some(task) = tasks.pop() {
            match task {
                Task::Payout { forger, reward } => {
                    let span = payout_span(&forger, reward);
                    let _enter = span.enter();
                    let Some(delegate) = self.ledger.account(&forger) else {
                        self.warn_payout(report, forger, reward, "forger is not in the ledger");
                        continue;
                    };
                    let stakeholders = self.ledger.stakeholders(&forger);
                    let credits =
                        split_reward(reward, delegate.reward_share, forger, &stakeholders);
                    debug!(stakeholders = stakeholders.len(), credits = credits.len(), "reward split");
                    for (account, amount) in credits.into_iter().rev() {
                        tasks.push(Task::Credit { account, amount });
                    }
                }
                Task::Credit { account, amount } => match self.credit(account, amount) {
                    Ok(forged) => {
                        self.record_forged(&forged);
                        self.metrics.payout_credits.inc();
                        report.credits.push(PayoutCredit {
                            account,
                            amount,
                            hash: forged.hash,
                        });
                    }
                    Err(e) => self.warn_payout(report, account, amount, &e.to_string()),
                },
            }
        }
    }

    fn warn_payout(&self, report: &mut PayoutReport, account: AccountId, amount: Amount, reason: &str) {
        warn!(%account, %amount, reason, "reward credit failed");
        self.metrics.payout_warnings.inc();
        report.warnings.push(PayoutWarning {
            account,
            amount,
            reason: reason.to_string(),
        });
    }

    /// Steps shared by every request and sub-request: check the blueprint,
    /// elect if the round is over, forge with the current forger, sign,
    /// verify, append, and apply the block's effect on the account.
    ///
    /// The forger is not credited here; callers record the block once the
    /// whole request has committed.
    fn forge_and_append(&mut self, request: &Request, origin: Origin) -> Result<Forged, NodeError> {
        let account_id = request.account;
        let blueprint = &request.blueprint;
        match origin {
            Origin::Request => self
                .ledger
                .check_blueprint(&account_id, blueprint, &self.params)?,
            Origin::Payout => self.ledger.check_reward_credit(&account_id, blueprint)?,
        }

        if self.dpos.update(&self.ledger, &self.params) {
            self.metrics.rounds_started.inc();
        }
        let forger = self.dpos.current_forger()?;

        let mut block = match self.dpos.round_mut().forge(
            &self.ledger,
            &account_id,
            blueprint,
            self.clock.now(),
        ) {
            Ok(block) => block,
            Err(e) => {
                self.metrics.forge_failures.inc();
                if let Some(delegate) = self.ledger.account_mut(&forger) {
                    delegate.missed_count += 1;
                }
                warn!(%forger, error = %e, "forge failed");
                return Err(e.into());
            }
        };

        let owner = self
            .ledger
            .account(&account_id)
            .ok_or(NodeError::AccountNotFound(account_id))?;
        block.sign(owner.private_key());
        self.verify_signatures(&block, owner, &forger)?;

        let hash = self.ledger.append_block(&account_id, block).map_err(|e| {
            error!(account = %account_id, error = %e, "forged block could not be appended");
            NodeError::AppendFailed(e)
        })?;

        let reward = self.apply_effects(&account_id, &blueprint.payload)?;
        let block_type = blueprint.block_type();
        debug!(%hash, %forger, %block_type, %reward, "block accepted");
        Ok(Forged {
            hash,
            block_type,
            forger,
            reward,
        })
    }

    fn verify_signatures(
        &self,
        block: &Block,
        owner: &Account,
        forger: &AccountId,
    ) -> Result<(), NodeError> {
        if !block.verify(owner.public_key()) {
            error!(account = %owner.id(), "owner signature does not verify");
            return Err(NodeError::SignatureInvalid { signer: "owner" });
        }
        let witness = self
            .ledger
            .account(forger)
            .ok_or(NodeError::AccountNotFound(*forger))?;
        if !block.verify_witness(witness.public_key()) {
            error!(%forger, "witness signature does not verify");
            return Err(NodeError::SignatureInvalid { signer: "witness" });
        }
        Ok(())
    }

    /// Apply an appended block's effect on its account and return the
    /// reward minted for its forger.
    fn apply_effects(
        &mut self,
        account_id: &AccountId,
        payload: &BlueprintPayload,
    ) -> Result<Amount, NodeError> {
        let params = &self.params;
        let account = self
            .ledger
            .account_mut(account_id)
            .ok_or(NodeError::AccountNotFound(*account_id))?;

        let reward = match payload {
            BlueprintPayload::Open => params.forge_reward,
            BlueprintPayload::Send { .. } => params.forge_reward.saturating_add(params.transaction_fee),
            BlueprintPayload::Receive { .. } => Amount::ZERO,
            BlueprintPayload::Change { changes } => {
                account.apply_vote_changes(changes);
                params.forge_reward.saturating_add(params.change_cost())
            }
            BlueprintPayload::Delegate { share } => {
                account.is_delegate = true;
                account.reward_share = *share;
                self.dpos.register_delegate(*account_id);
                params.forge_reward.saturating_add(params.delegate_cost())
            }
        };
        Ok(reward)
    }

    fn pair_receive(
        &mut self,
        send: BlockHash,
        sender: AccountId,
        destination: AccountId,
        amount: Amount,
    ) -> Result<Forged, NodeError> {
        let receiver = self
            .ledger
            .account(&destination)
            .ok_or(NodeError::AccountNotFound(destination))?;
        let prev = self
            .ledger
            .latest_block(&destination)
            .ok_or(LedgerError::NotOpened(destination))?;
        let source = self
            .ledger
            .block(&send)
            .ok_or(LedgerError::BlockNotFound(send))?;
        let sender_key = self
            .ledger
            .account(&sender)
            .ok_or(NodeError::AccountNotFound(sender))?
            .public_key();

        let blueprint = receiver.create_receive_block(amount, prev, source, sender_key)?;
        self.forge_and_append(&Request::new(destination, blueprint), Origin::Request)
    }

    fn credit(&mut self, account_id: AccountId, amount: Amount) -> Result<Forged, NodeError> {
        let account = self
            .ledger
            .account(&account_id)
            .ok_or(NodeError::AccountNotFound(account_id))?;
        let prev = self
            .ledger
            .latest_block(&account_id)
            .ok_or(LedgerError::NotOpened(account_id))?;
        let blueprint = account.create_reward_block(amount, prev)?;
        self.forge_and_append(&Request::new(account_id, blueprint), Origin::Payout)
    }

    /// Distribute `reward` from `forger` to its stakeholders and itself.
    ///
    /// Failed credits are reported as warnings and never abort the payout.
    pub fn payout(&mut self, forger: AccountId, reward: Amount) -> PayoutReport {
        let mut report = PayoutReport::default();
        self.run_payouts(vec![Task::Payout { forger, reward }], &mut report);
        report
    }

    // ── Convenience operations ───────────────────────────────────────────

    /// Register a fresh account under `username` and open it.
    pub fn open_account(&mut self, username: &str) -> Result<AccountId, NodeError> {
        self.open_account_with_keys(generate_keypair(), username)
    }

    /// Register and open an account with known keys.
    ///
    /// If the Open cannot be forged the registration is undone, so the
    /// username stays free.
    pub fn open_account_with_keys(
        &mut self,
        keys: KeyPair,
        username: &str,
    ) -> Result<AccountId, NodeError> {
        let account = Account::new(keys);
        let blueprint = account.create_open_block();
        let id = self.ledger.insert_account(account, username)?;

        if let Err(e) = self.process(Request::new(id, blueprint)) {
            warn!(account = %id, username, error = %e, "open failed, account removed");
            self.ledger.remove_unopened_account(&id)?;
            return Err(e);
        }
        info!(account = %id, username, "account opened");
        Ok(id)
    }

    /// Send `amount` from one account to another. The Receive on the
    /// destination chain is forged in the same call.
    pub fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<ProcessOutcome, NodeError> {
        let account = self
            .ledger
            .account(&from)
            .ok_or(NodeError::AccountNotFound(from))?;
        let prev = self
            .ledger
            .latest_block(&from)
            .ok_or(LedgerError::NotOpened(from))?;
        let blueprint = account.create_send_block(&self.params, amount, to, prev)?;
        self.process(Request::new(from, blueprint))
    }

    /// Register an account as a delegate passing `share_percent` of its
    /// rewards to its voters.
    pub fn register_delegate(
        &mut self,
        id: AccountId,
        share_percent: f64,
    ) -> Result<ProcessOutcome, NodeError> {
        let account = self
            .ledger
            .account(&id)
            .ok_or(NodeError::AccountNotFound(id))?;
        let prev = self
            .ledger
            .latest_block(&id)
            .ok_or(LedgerError::NotOpened(id))?;
        let blueprint = account.create_delegate_block(&self.params, prev, share_percent)?;
        self.process(Request::new(id, blueprint))
    }

    /// Update an account's votes from `+name` / `-name` tokens.
    ///
    /// The whole token list is checked against the vote limit first; then
    /// one Change block is forged per chunk, tail chunk first. Chunks that
    /// change nothing forge no block.
    pub fn elect<S: AsRef<str>>(
        &mut self,
        id: AccountId,
        tokens: &[S],
    ) -> Result<Vec<ProcessOutcome>, NodeError> {
        let span = election_span(&id, tokens.len());
        let _enter = span.enter();

        let account = self
            .ledger
            .account(&id)
            .ok_or(NodeError::AccountNotFound(id))?;
        check_max_delegate_limit(&self.params, account, tokens)?;

        let mut outcomes = Vec::new();
        for chunk in vote_chunks(&self.params, tokens) {
            let account = self
                .ledger
                .account(&id)
                .ok_or(NodeError::AccountNotFound(id))?;
            let changes = plan_vote_chunk(account, chunk, &self.ledger);
            if changes.is_empty() {
                debug!(tokens = chunk.len(), "chunk changes no votes");
                continue;
            }
            let prev = self
                .ledger
                .latest_block(&id)
                .ok_or(LedgerError::NotOpened(id))?;
            let blueprint = account.create_change_block(&self.params, changes, prev)?;
            outcomes.push(self.process(Request::new(id, blueprint))?);
        }
        Ok(outcomes)
    }

    /// Open the genesis account: the self-witnessed first delegate.
    pub fn open_genesis(&mut self, keys: KeyPair, username: &str) -> Result<AccountId, NodeError> {
        let id = vigil_ledger::open_genesis_account(
            &mut self.ledger,
            &self.params,
            keys,
            username,
            &*self.clock,
        )?;
        self.dpos.register_delegate(id);
        self.metrics.observe_ledger(&self.ledger.summary());
        Ok(id)
    }

    /// The forger that will witness the next block, electing a new round
    /// if the current one has ended.
    pub fn next_forger(&mut self) -> Result<AccountId, ConsensusError> {
        if self.dpos.update(&self.ledger, &self.params) {
            self.metrics.rounds_started.inc();
        }
        self.dpos.current_forger()
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("params", &self.params)
            .field("ledger", &self.ledger.summary())
            .field("dpos", &self.dpos)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_crypto::keypair_from_seed;

    fn node_with_genesis() -> (Node, AccountId) {
        let mut node = Node::new(ProtocolParams::default(), Box::new(SystemClock)).unwrap();
        let genesis = node
            .open_genesis(keypair_from_seed(&[1u8; 32]), "genesis")
            .unwrap();
        (node, genesis)
    }

    #[test]
    fn rewards_follow_block_type() {
        let (mut node, genesis) = node_with_genesis();
        let params = node.params().clone();
        let alice = node
            .open_account_with_keys(keypair_from_seed(&[2u8; 32]), "alice")
            .unwrap();

        let send = node.transfer(genesis, alice, Amount::from_units(100)).unwrap();
        assert_eq!(send.reward, params.forge_reward + params.transaction_fee);

        let delegate = node.register_delegate(alice, 10.0).unwrap();
        assert_eq!(delegate.reward, params.forge_reward + params.delegate_cost());

        let change = node.elect(alice, &["+genesis"]).unwrap();
        assert_eq!(change[0].reward, params.forge_reward + params.change_cost());
    }

    #[test]
    fn counters_track_the_pipeline() {
        let (mut node, genesis) = node_with_genesis();
        let alice = node.open_account("alice").unwrap();
        node.transfer(genesis, alice, Amount::from_units(1)).unwrap();

        let metrics = node.metrics();
        // Open, its reward credit, Send, paired Receive, Send reward credit.
        assert_eq!(metrics.blocks_forged.get(), 5);
        assert_eq!(metrics.payout_credits.get(), 2);
        assert_eq!(metrics.requests_processed.get(), 2);
        assert_eq!(metrics.block_count.get(), 8);

        let forger = node.ledger().account(&genesis).unwrap();
        assert_eq!(forger.forged_count, 5);
        assert_eq!(forger.missed_count, 0);
    }

    #[test]
    fn open_failure_frees_the_username() {
        let (mut node, _) = node_with_genesis();
        let keys = keypair_from_seed(&[1u8; 32]);
        // Same keys as genesis: the id is already registered.
        assert!(matches!(
            node.open_account_with_keys(keys, "other"),
            Err(NodeError::Ledger(LedgerError::AccountExists(_)))
        ));
        assert!(node.ledger().account_by_username("other").is_none());
    }

    #[test]
    fn snapshot_covers_every_account() {
        let (mut node, _) = node_with_genesis();
        node.open_account("alice").unwrap();
        let snapshot = node.snapshot();
        assert!(snapshot.verify());
        assert_eq!(snapshot.account_count(), 2);
        let restored = LedgerSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(restored.hash, snapshot.hash);
        assert_eq!(restored.accounts, snapshot.accounts);
    }
}
