use thiserror::Error;
use vigil_types::AccountId;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("ledger error: {0}")]
    Ledger(#[from] vigil_ledger::LedgerError),

    #[error("validation error: {0}")]
    Validation(#[from] vigil_ledger::ValidationError),

    #[error("consensus error: {0}")]
    Consensus(#[from] vigil_consensus::ConsensusError),

    #[error("{signer} signature is invalid")]
    SignatureInvalid { signer: &'static str },

    #[error("append failed: {0}")]
    AppendFailed(vigil_ledger::LedgerError),

    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("request queue closed")]
    QueueClosed,
}
