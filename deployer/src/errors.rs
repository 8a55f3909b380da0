// deployer/src/errors.rs

use ethers::types::{Address, TxHash};
use thiserror::Error;

/// Errors raised by the batch driver before or instead of a remote call.
///
/// Everything here is a caller problem: the run stops immediately and no
/// (further) remote work is issued.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("invalid batch size {0}: must be greater than zero")]
    InvalidBatchSize(usize),

    #[error("invalid gas limit: must be greater than zero")]
    ZeroGasLimit,

    #[error("rate update #{index} pairs token {token:?} with itself")]
    SelfPair { index: usize, token: Address },

    #[error("rate update #{index} references the zero address")]
    ZeroRateAddress { index: usize },

    #[error("funding request #{index} for token {token:?} has a zero amount")]
    ZeroAmount { index: usize, token: Address },

    #[error("funding request #{index} references the zero token address")]
    ZeroFundingToken { index: usize },

    #[error("funding recipient is the zero address")]
    ZeroRecipient,

    /// The ledger refused the call shape itself (not a remote rejection).
    #[error("malformed remote call: {0}")]
    MalformedCall(String),
}

/// Failures reported by a remote ledger / contract factory implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Node or contract refused the call before it was mined (revert during
    /// estimation, out of gas, nonce problems...). Message kept as returned.
    #[error("{0}")]
    Rejected(String),

    #[error("transaction {0:?} reverted on-chain (status 0)")]
    Reverted(TxHash),

    #[error("no confirmation within {0}s")]
    Timeout(u64),

    #[error("transaction {0:?} dropped before confirmation")]
    Dropped(TxHash),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("contract artifact error: {0}")]
    Artifact(String),

    /// Parallel arrays of unequal length and similar shape violations.
    #[error("malformed call: {0}")]
    MalformedCall(String),
}

impl LedgerError {
    /// Caller-side faults are propagated; everything else is recorded as a
    /// failed unit of work.
    pub fn is_caller_fault(&self) -> bool {
        matches!(self, LedgerError::MalformedCall(_))
    }
}

/// Errors while resolving a deployment plan into concrete requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("plan '{plan}' references unknown token symbol {symbol}")]
    UnknownSymbol { plan: String, symbol: String },

    #[error("token symbol {0} is declared more than once")]
    DuplicateSymbol(String),

    #[error("plan '{plan}' pairs {symbol} with itself")]
    SelfPair { plan: String, symbol: String },

    #[error("invalid amount {amount:?} for {symbol}: {reason}")]
    InvalidAmount {
        symbol: String,
        amount: String,
        reason: String,
    },

    #[error("plan '{plan}' gives the zero address for {symbol}")]
    ZeroAddress { plan: String, symbol: String },

    #[error("plan '{0}' needs a router address but none is configured")]
    MissingRouter(String),

    #[error("plan '{plan}' needs an address for {symbol} but none is configured")]
    MissingExistingToken { plan: String, symbol: String },
}

/// Errors from the upstream price-feed service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceFeedError {
    #[error("price feed service unreachable: {0}")]
    Unreachable(String),

    #[error("price feed service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed price feed payload: {0}")]
    Malformed(String),

    #[error("invalid price feed id {0:?}")]
    InvalidId(String),

    #[error("no known price feed for pair {0:?}")]
    UnknownPair(String),
}
