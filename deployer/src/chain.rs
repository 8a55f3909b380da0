// deployer/src/chain.rs

use async_trait::async_trait;
use ethers::{
    prelude::{Http, LocalWallet, Middleware, Provider, Signer, SignerMiddleware},
    types::{Address, U256},
};
use eyre::{Result, WrapErr};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::bindings::{MockERC20Token, MockUniswapV3Router};
use crate::config::ChainConfig;
use crate::errors::LedgerError;
use crate::ledger::RemoteLedger;
use crate::transaction::{send_and_confirm, ConfirmSettings};
use crate::types::Confirmation;

pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Provider + signer for the configured network. The chain id is queried
/// from the node unless pinned in the config.
pub async fn connect(config: &ChainConfig) -> Result<Arc<SignerClient>> {
    let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
        .wrap_err_with(|| format!("Invalid RPC_URL {}", config.rpc_url))?;
    let chain_id = match config.chain_id {
        Some(id) => id,
        None => provider.get_chainid().await.wrap_err("Failed to query chain id")?.as_u64(),
    };
    info!(chain_id, "RPC OK");
    let wallet = config
        .private_key
        .parse::<LocalWallet>()
        .wrap_err("PRIVATE_KEY is not a valid secp256k1 key")?
        .with_chain_id(chain_id);
    Ok(Arc::new(SignerMiddleware::new(provider, wallet)))
}

/// `RemoteLedger` backed by the mock router and mock token contracts.
#[derive(Debug, Clone)]
pub struct EthersLedger {
    client: Arc<SignerClient>,
    router: Address,
    confirm: ConfirmSettings,
}

impl EthersLedger {
    pub fn new(client: Arc<SignerClient>, router: Address, confirm: ConfirmSettings) -> Self {
        Self { client, router, confirm }
    }

    pub fn router(&self) -> Address {
        self.router
    }
}

#[async_trait]
impl RemoteLedger for EthersLedger {
    #[instrument(
        skip_all,
        fields(router = ?self.router, pairs = tokens_in.len(), gas_limit = %gas_limit)
    )]
    async fn submit_rate_update_batch(
        &self,
        tokens_in: Vec<Address>,
        tokens_out: Vec<Address>,
        rates: Vec<U256>,
        gas_limit: U256,
    ) -> Result<Confirmation, LedgerError> {
        if tokens_in.len() != tokens_out.len() || tokens_in.len() != rates.len() {
            return Err(LedgerError::MalformedCall(format!(
                "parallel arrays differ in length: {} tokensIn, {} tokensOut, {} rates",
                tokens_in.len(),
                tokens_out.len(),
                rates.len()
            )));
        }
        let router = MockUniswapV3Router::new(self.router, self.client.clone());
        let call = router.set_exchange_rates(tokens_in, tokens_out, rates).gas(gas_limit);
        send_and_confirm(call, &self.confirm).await
    }

    #[instrument(skip_all, fields(token = ?token, recipient = ?recipient, amount = %amount))]
    async fn mint(
        &self,
        token: Address,
        recipient: Address,
        amount: U256,
    ) -> Result<Confirmation, LedgerError> {
        let contract = MockERC20Token::new(token, self.client.clone());
        send_and_confirm(contract.mint(recipient, amount), &self.confirm).await
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, LedgerError> {
        MockERC20Token::new(token, self.client.clone())
            .balance_of(owner)
            .call()
            .await
            .map_err(|e| LedgerError::Provider(e.to_string()))
    }
}
