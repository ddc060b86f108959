use thiserror::Error;
use vigil_ledger::{BlockType, LedgerError, ValidationError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsensusError {
    #[error("no forger available")]
    NoForger,

    #[error("round has ended")]
    RoundEnded,

    #[error("{block_type} block is not valid here: {reason}")]
    InvalidBlockType {
        block_type: BlockType,
        reason: &'static str,
    },

    #[error("forge failed: {reason}")]
    ForgeFailed { reason: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
