//! Genesis account: the first account on every ledger.
//!
//! The genesis account bypasses forging because no forger exists yet. Its
//! three blocks are self-witnessed:
//! - an Open holding `genesis_balance`
//! - a Delegate registering it with a 100% reward share
//! - a Change voting for itself, which makes it the first elected forger
//!
//! None of them are charged fees. Call this once per ledger, before any
//! request is processed.

use tracing::info;
use vigil_types::{AccountId, BlockHash, Clock, KeyPair, ProtocolParams, RewardShare, VoteChange};

use crate::account::Account;
use crate::block::Block;
use crate::error::LedgerError;
use crate::ledger::Ledger;

pub fn open_genesis_account(
    ledger: &mut Ledger,
    params: &ProtocolParams,
    keys: KeyPair,
    username: &str,
    clock: &dyn Clock,
) -> Result<AccountId, LedgerError> {
    let id = ledger.insert_account(Account::new(keys), username)?;

    let open = Block::open(id, params.genesis_balance, clock.now());
    let open_hash = append_self_witnessed(ledger, &id, open)?;

    let delegate = Block::delegate(params.genesis_balance, open_hash, RewardShare::FULL, clock.now());
    let delegate_hash = append_self_witnessed(ledger, &id, delegate)?;

    let changes = vec![VoteChange::Add(id)];
    let change = Block::change(params.genesis_balance, changes.clone(), delegate_hash, clock.now());
    append_self_witnessed(ledger, &id, change)?;

    let account = ledger
        .account_mut(&id)
        .ok_or(LedgerError::AccountNotFound(id))?;
    account.is_delegate = true;
    account.reward_share = RewardShare::FULL;
    account.apply_vote_changes(&changes);

    info!(account = %id, balance = %params.genesis_balance, "genesis account opened");
    Ok(id)
}

fn append_self_witnessed(
    ledger: &mut Ledger,
    id: &AccountId,
    mut block: Block,
) -> Result<BlockHash, LedgerError> {
    let account = ledger
        .account(id)
        .ok_or(LedgerError::AccountNotFound(*id))?;
    block.sign(account.private_key());
    block.sign_witness(account.private_key());
    ledger.append_block(id, block)
}
