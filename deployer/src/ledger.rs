// deployer/src/ledger.rs
// Narrow seams between the driver/workflow and the chain.

use async_trait::async_trait;
use ethers::types::{Address, U256};
use std::fmt;
use std::sync::Arc;

use crate::errors::LedgerError;
use crate::types::Confirmation;

/// State-changing calls against the router and mock tokens.
///
/// Implementations own timeouts: a confirmation that never arrives must come
/// back as `LedgerError::Timeout` rather than hang the caller.
#[async_trait]
pub trait RemoteLedger: Send + Sync {
    async fn submit_rate_update_batch(
        &self,
        tokens_in: Vec<Address>,
        tokens_out: Vec<Address>,
        rates: Vec<U256>,
        gas_limit: U256,
    ) -> Result<Confirmation, LedgerError>;

    async fn mint(
        &self,
        token: Address,
        recipient: Address,
        amount: U256,
    ) -> Result<Confirmation, LedgerError>;

    /// Read-only; only used for verification logging.
    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, LedgerError>;
}

#[async_trait]
impl<T: RemoteLedger + ?Sized> RemoteLedger for Arc<T> {
    async fn submit_rate_update_batch(
        &self,
        tokens_in: Vec<Address>,
        tokens_out: Vec<Address>,
        rates: Vec<U256>,
        gas_limit: U256,
    ) -> Result<Confirmation, LedgerError> {
        (**self).submit_rate_update_batch(tokens_in, tokens_out, rates, gas_limit).await
    }

    async fn mint(
        &self,
        token: Address,
        recipient: Address,
        amount: U256,
    ) -> Result<Confirmation, LedgerError> {
        (**self).mint(token, recipient, amount).await
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, LedgerError> {
        (**self).balance_of(token, owner).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    MockToken,
    MockRouter,
}

impl ContractKind {
    /// Contract name as it appears in the compiled artifacts.
    pub fn artifact_name(&self) -> &'static str {
        match self {
            ContractKind::MockToken => "MockERC20Token",
            ContractKind::MockRouter => "MockUniswapV3Router",
        }
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.artifact_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructorArgs {
    None,
    Token {
        name: String,
        symbol: String,
        decimals: u8,
        initial_supply: U256,
        faucet_amount: U256,
    },
}

#[async_trait]
pub trait ContractFactory: Send + Sync {
    async fn deploy(&self, kind: ContractKind, args: ConstructorArgs)
        -> Result<Address, LedgerError>;
}
