use thiserror::Error;
use vigil_types::{AccountId, Amount, BlockHash};

/// Local validation failures raised by the blueprint factories.
///
/// These are raised before anything is forged; no ledger state has changed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Amount, available: Amount },

    #[error("reward share {percent} is outside [0, 100]")]
    InvalidShare { percent: f64 },

    #[error("account is already a delegate")]
    AlreadyDelegate,

    #[error("vote set would hold {count} delegates, limit is {max}")]
    TooManyDelegates { count: usize, max: usize },

    #[error("change block carries {count} vote changes, limit is {max}")]
    TooManyChanges { count: usize, max: usize },

    #[error("block signature does not verify")]
    SignatureInvalid,

    #[error("source block is not a send")]
    NotASend,

    #[error("resulting balance overflows")]
    BalanceOverflow,
}

/// Failures maintaining the ledger's structural invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("account already registered: {0}")]
    AccountExists(AccountId),

    #[error("username already taken: {0}")]
    UsernameTaken(String),

    #[error("invalid username: {0:?}")]
    InvalidUsername(String),

    #[error("account {0} has not been opened")]
    NotOpened(AccountId),

    #[error("account {0} is already opened")]
    AlreadyOpened(AccountId),

    #[error("account {0} already has blocks and cannot be removed")]
    AccountInUse(AccountId),

    #[error("block gap: expected previous {expected}, found {found}")]
    BlockGap { expected: BlockHash, found: BlockHash },

    #[error("invalid block: {reason}")]
    InvalidBlock { reason: String },

    #[error("duplicate block: {0}")]
    DuplicateBlock(BlockHash),

    #[error("block not found: {0}")]
    BlockNotFound(BlockHash),

    #[error("unknown send destination: {0}")]
    UnknownDestination(AccountId),

    #[error("source block not found: {0}")]
    SourceNotFound(BlockHash),

    #[error("source block {0} is not a send")]
    SourceNotASend(BlockHash),

    #[error("source block {0} was sent to a different account")]
    SourceWrongDestination(BlockHash),

    #[error("source block {0} has already been received")]
    DuplicateSource(BlockHash),

    #[error("receive amount {actual} does not match sent amount {expected}")]
    AmountMismatch { expected: Amount, actual: Amount },

    #[error("block {0} is not the chain tip")]
    NotChainTip(BlockHash),

    #[error("send {0} has already been received and cannot be rolled back")]
    SendAlreadyReceived(BlockHash),

    #[error("resulting balance {actual} does not match expected {expected}")]
    BalanceMismatch { expected: Amount, actual: Amount },

    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Amount, available: Amount },

    #[error("resulting balance overflows")]
    BalanceOverflow,

    #[error("change block carries {count} vote changes, limit is {max}")]
    TooManyChanges { count: usize, max: usize },

    #[error("vote set would hold {count} delegates, limit is {max}")]
    TooManyDelegates { count: usize, max: usize },

    #[error("account {0} is not a delegate")]
    NotADelegate(AccountId),

    #[error("account {0} is already a delegate")]
    AlreadyDelegate(AccountId),

    #[error("reward credits are issued by the node only")]
    RewardNotAllowed,
}
