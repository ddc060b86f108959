//! Vote parsing and election planning.
//!
//! Clients express vote changes as tokens: `+name` votes for the account
//! registered under `name`, `-name` withdraws a vote. Tokens shorter than two
//! characters, unknown symbols and unknown usernames are skipped rather than
//! rejected.
//!
//! A single Change block carries at most `max_delegates_per_block` changes,
//! so a long token list is split into chunks. Chunks are applied tail-first;
//! the head chunk lands last and its Change block is the chain tip once the
//! whole election has been applied.

use tracing::{debug, warn};
use vigil_ledger::{Account, Ledger, ValidationError};
use vigil_types::{ProtocolParams, VoteChange};

/// Reject a token list that would push the account's vote set above
/// `max_delegates_per_account`.
///
/// Counts every well-formed `+` and `-` token, whether or not it will turn
/// out to change anything.
pub fn check_max_delegate_limit<S: AsRef<str>>(
    params: &ProtocolParams,
    account: &Account,
    tokens: &[S],
) -> Result<(), ValidationError> {
    let mut adds = 0usize;
    let mut removes = 0usize;
    for token in tokens {
        let token = token.as_ref();
        if token.chars().count() < 2 {
            continue;
        }
        match token.chars().next() {
            Some('+') => adds += 1,
            Some('-') => removes += 1,
            _ => debug!(token, "unknown vote symbol"),
        }
    }

    let count = (account.voted_delegates.len() + adds).saturating_sub(removes);
    if count > params.max_delegates_per_account {
        return Err(ValidationError::TooManyDelegates {
            count,
            max: params.max_delegates_per_account,
        });
    }
    Ok(())
}

/// Resolve one token to a vote change. `None` for malformed tokens, unknown
/// symbols and unknown usernames.
pub fn parse_vote_token(token: &str, ledger: &Ledger) -> Option<VoteChange> {
    let mut chars = token.chars();
    let symbol = chars.next()?;
    let username = chars.as_str();
    if username.is_empty() {
        return None;
    }
    let Some(target) = ledger.account_by_username(username) else {
        warn!(username, "vote for unknown account skipped");
        return None;
    };
    match symbol {
        '+' => Some(VoteChange::Add(target.id())),
        '-' => Some(VoteChange::Remove(target.id())),
        _ => {
            warn!(token, "unknown vote symbol skipped");
            None
        }
    }
}

/// Turn one chunk of tokens into the vote delta for a Change block.
///
/// An add takes effect only for a registered delegate the account does not
/// already vote for; a remove only for an existing vote. Tokens within the
/// chunk see the effect of the ones before them.
pub fn plan_vote_chunk<S: AsRef<str>>(
    account: &Account,
    chunk: &[S],
    ledger: &Ledger,
) -> Vec<VoteChange> {
    let mut voted = account.voted_delegates.clone();
    let mut changes = Vec::new();
    for token in chunk {
        let Some(change) = parse_vote_token(token.as_ref(), ledger) else {
            continue;
        };
        match change {
            VoteChange::Add(delegate) => {
                let eligible = ledger.account(&delegate).is_some_and(|d| d.is_delegate);
                if eligible && voted.insert(delegate) {
                    changes.push(change);
                }
            }
            VoteChange::Remove(delegate) => {
                if voted.remove(&delegate) {
                    changes.push(change);
                }
            }
        }
    }
    changes
}

/// Split tokens into Change-block sized chunks, tail chunk first.
pub fn vote_chunks<'a, S>(params: &ProtocolParams, tokens: &'a [S]) -> Vec<&'a [S]> {
    let size = params.max_delegates_per_block.max(1);
    let mut chunks: Vec<&[S]> = tokens.chunks(size).collect();
    chunks.reverse();
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_crypto::keypair_from_seed;
    use vigil_ledger::Block;
    use vigil_types::{AccountId, Amount, Timestamp};

    fn ledger_with(delegates: &[&str], others: &[&str]) -> Ledger {
        let mut ledger = Ledger::new();
        let mut seed = 1u8;
        for (name, is_delegate) in delegates
            .iter()
            .map(|n| (n, true))
            .chain(others.iter().map(|n| (n, false)))
        {
            let mut account = Account::new(keypair_from_seed(&[seed; 32]));
            account.is_delegate = is_delegate;
            let id = ledger.insert_account(account, name).unwrap();
            ledger
                .append_block(&id, Block::open(id, Amount::ZERO, Timestamp::EPOCH))
                .unwrap();
            seed += 1;
        }
        ledger
    }

    fn id_of(ledger: &Ledger, name: &str) -> AccountId {
        ledger.account_by_username(name).unwrap().id()
    }

    #[test]
    fn limit_counts_adds_minus_removes() {
        let params = ProtocolParams {
            max_delegates_per_account: 2,
            ..ProtocolParams::default()
        };
        let mut account = Account::new(keypair_from_seed(&[9u8; 32]));
        account.voted_delegates.insert(AccountId::new([1u8; 32]));

        assert!(check_max_delegate_limit(&params, &account, &["+a"]).is_ok());
        assert!(check_max_delegate_limit(&params, &account, &["+a", "+b", "-c"]).is_ok());
        assert_eq!(
            check_max_delegate_limit(&params, &account, &["+a", "+b"]).unwrap_err(),
            ValidationError::TooManyDelegates { count: 3, max: 2 }
        );
        // Malformed and unknown tokens do not count.
        assert!(check_max_delegate_limit(&params, &account, &["+a", "+", "*b", ""]).is_ok());
    }

    #[test]
    fn parse_resolves_case_insensitive_usernames() {
        let ledger = ledger_with(&["alice"], &[]);
        let alice = id_of(&ledger, "alice");
        assert_eq!(parse_vote_token("+Alice", &ledger), Some(VoteChange::Add(alice)));
        assert_eq!(parse_vote_token("-alice", &ledger), Some(VoteChange::Remove(alice)));
        assert_eq!(parse_vote_token("*alice", &ledger), None);
        assert_eq!(parse_vote_token("+nobody", &ledger), None);
        assert_eq!(parse_vote_token("+", &ledger), None);
        assert_eq!(parse_vote_token("", &ledger), None);
    }

    #[test]
    fn plan_only_adds_delegates_not_yet_voted() {
        let ledger = ledger_with(&["alice", "bob"], &["carol"]);
        let alice = id_of(&ledger, "alice");
        let bob = id_of(&ledger, "bob");
        let mut voter = Account::new(keypair_from_seed(&[50u8; 32]));
        voter.voted_delegates.insert(bob);

        let changes = plan_vote_chunk(
            &voter,
            &["+alice", "+alice", "+bob", "+carol", "-dave", "x"],
            &ledger,
        );
        assert_eq!(changes, vec![VoteChange::Add(alice)]);
        // Planning does not touch the account.
        assert!(!voter.votes_for(&alice));
    }

    #[test]
    fn plan_removes_only_existing_votes() {
        let ledger = ledger_with(&["alice", "bob"], &[]);
        let alice = id_of(&ledger, "alice");
        let mut voter = Account::new(keypair_from_seed(&[50u8; 32]));
        voter.voted_delegates.insert(alice);

        let changes = plan_vote_chunk(&voter, &["-bob", "-alice", "-alice", "+alice"], &ledger);
        assert_eq!(changes, vec![VoteChange::Remove(alice), VoteChange::Add(alice)]);
    }

    #[test]
    fn chunks_come_tail_first() {
        let params = ProtocolParams {
            max_delegates_per_block: 2,
            ..ProtocolParams::default()
        };
        let tokens = ["+a", "+b", "+c", "+d", "+e"];
        let chunks = vote_chunks(&params, &tokens);
        assert_eq!(chunks, vec![&tokens[4..], &tokens[2..4], &tokens[0..2]]);
        assert!(vote_chunks::<&str>(&params, &[]).is_empty());
    }
}
