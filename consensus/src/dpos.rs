//! Delegated proof-of-stake bookkeeping: the delegate set and the current
//! round.

use std::collections::BTreeSet;

use tracing::info;
use vigil_ledger::Ledger;
use vigil_types::{AccountId, ProtocolParams};

use crate::delegate::Delegate;
use crate::error::ConsensusError;
use crate::round::Round;
use crate::weights::calculate_weights;

#[derive(Debug, Default)]
pub struct Dpos {
    /// Ranked delegates from the most recent election.
    delegates: Vec<Delegate>,
    /// Every account that has registered as a delegate.
    registered: BTreeSet<AccountId>,
    round: Round,
    rounds_started: u64,
}

impl Dpos {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new round if the current one has ended.
    ///
    /// Re-election is lazy: weights are recomputed from the ledger only when
    /// a request arrives and finds the round over. Only delegates registered
    /// through [`register_delegate`](Self::register_delegate) are eligible.
    /// Returns whether a new round was started.
    pub fn update(&mut self, ledger: &Ledger, params: &ProtocolParams) -> bool {
        if !self.round.has_ended() {
            return false;
        }
        let registered = &self.registered;
        self.delegates = calculate_weights(ledger)
            .into_iter()
            .filter(|delegate| registered.contains(&delegate.account))
            .collect();
        self.round = Round::new(self.delegates.clone(), params.max_forgers);
        self.rounds_started += 1;
        info!(
            round = self.rounds_started,
            forgers = self.round.forgers().len(),
            delegates = self.delegates.len(),
            "new forging round"
        );
        true
    }

    /// The current forger, or `NoForger` if nobody is elected.
    pub fn current_forger(&self) -> Result<AccountId, ConsensusError> {
        if self.round.forgers().is_empty() {
            return Err(ConsensusError::NoForger);
        }
        Ok(self.round.forger()?.account)
    }

    pub fn register_delegate(&mut self, account: AccountId) {
        if self.registered.insert(account) {
            info!(delegate = %account, "delegate registered");
        }
    }

    pub fn is_registered(&self, account: &AccountId) -> bool {
        self.registered.contains(account)
    }

    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    pub fn delegates(&self) -> &[Delegate] {
        &self.delegates
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn round_mut(&mut self) -> &mut Round {
        &mut self.round
    }

    pub fn rounds_started(&self) -> u64 {
        self.rounds_started
    }
}
