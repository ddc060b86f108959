//! Delegate weight aggregation.
//!
//! Every opened account lends its chain-tip balance, in full, to each
//! delegate it votes for. The aggregated table is ranked heaviest first;
//! equal weights are ordered by ascending account id so every node elects
//! the same forgers from the same ledger.

use std::collections::HashMap;

use vigil_ledger::Ledger;
use vigil_types::{AccountId, Amount};

use crate::delegate::Delegate;

/// Aggregated weight per voted-for delegate.
#[derive(Clone, Debug, Default)]
pub struct WeightTable {
    weights: HashMap<AccountId, Amount>,
}

impl WeightTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add weight to a delegate, registering it if this is its first vote.
    pub fn add_weight(&mut self, delegate: &AccountId, weight: Amount) {
        let entry = self.weights.entry(*delegate).or_insert(Amount::ZERO);
        *entry = entry.saturating_add(weight);
    }

    /// A delegate's current weight. Zero if nobody votes for it.
    pub fn weight(&self, delegate: &AccountId) -> Amount {
        self.weights.get(delegate).copied().unwrap_or(Amount::ZERO)
    }

    pub fn delegate_count(&self) -> usize {
        self.weights.len()
    }

    /// Rebuild from `(voted delegates, tip balance)` pairs, one per account.
    pub fn rebuild_from_accounts<'a, I, D>(&mut self, accounts: I)
    where
        I: IntoIterator<Item = (D, Amount)>,
        D: IntoIterator<Item = &'a AccountId>,
    {
        self.weights.clear();
        for (delegates, balance) in accounts {
            for delegate in delegates {
                self.add_weight(delegate, balance);
            }
        }
    }

    /// Delegates sorted by descending weight, ties by ascending id.
    pub fn ranked(&self) -> Vec<Delegate> {
        let mut delegates: Vec<Delegate> = self
            .weights
            .iter()
            .map(|(account, weight)| Delegate::new(*account, *weight))
            .collect();
        delegates.sort_by(|a, b| b.weight.cmp(&a.weight).then(a.account.cmp(&b.account)));
        delegates
    }
}

/// Aggregate voting weight from the ledger and rank the delegates.
///
/// Unopened accounts carry no weight. Votes for accounts that are not
/// registered delegates are ignored.
pub fn calculate_weights(ledger: &Ledger) -> Vec<Delegate> {
    let mut table = WeightTable::new();
    let voters = ledger.accounts().filter_map(|account| {
        let balance = ledger.latest_block(&account.id())?.balance();
        let delegates = account
            .voted_delegates
            .iter()
            .filter(|id| ledger.account(id).is_some_and(|d| d.is_delegate));
        Some((delegates, balance))
    });
    table.rebuild_from_accounts(voters);
    table.ranked()
}
