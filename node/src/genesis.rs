//! Bootstrapping the first delegates.
//!
//! A fresh network has a single forger, the genesis account. The bootstrap
//! opens `genesis_1..genesis_N`, funds each with an equal cut of the genesis
//! balance, registers it as a delegate with a 100% reward share and has it
//! vote for itself. A delegate that fails any step is logged and skipped;
//! the rest still come up.

use tracing::{info, warn};
use vigil_types::{AccountId, Amount};

use crate::error::NodeError;
use crate::node::Node;
use crate::tracing_spans::genesis_span;

impl Node {
    /// Open and fund `count` genesis delegates from `genesis`. Returns the
    /// ids of the delegates that came up fully.
    pub fn bootstrap_genesis_delegates(&mut self, genesis: AccountId, count: usize) -> Vec<AccountId> {
        let span = genesis_span(count);
        let _enter = span.enter();

        let Some(balance) = self.ledger().latest_block(&genesis).map(|b| b.balance()) else {
            warn!(%genesis, "genesis account is not opened, no delegates bootstrapped");
            return Vec::new();
        };
        let fees = Amount::new(
            self.params()
                .transaction_fee
                .raw()
                .saturating_mul(count as u128),
        );
        let Some((funding, _)) = balance.saturating_sub(fees).split(count) else {
            return Vec::new();
        };

        let mut delegates = Vec::with_capacity(count);
        for i in 1..=count {
            let username = format!("genesis_{i}");
            match self.bootstrap_delegate(genesis, &username, funding) {
                Ok(id) => delegates.push(id),
                Err(e) => warn!(username, error = %e, "genesis delegate skipped"),
            }
        }
        info!(
            requested = count,
            opened = delegates.len(),
            %funding,
            "genesis delegates bootstrapped"
        );
        delegates
    }

    fn bootstrap_delegate(
        &mut self,
        genesis: AccountId,
        username: &str,
        funding: Amount,
    ) -> Result<AccountId, NodeError> {
        let id = self.open_account(username)?;
        self.transfer(genesis, id, funding)?;
        self.register_delegate(id, 100.0)?;
        self.elect(id, &[format!("+{username}")])?;
        Ok(id)
    }
}
