// deployer/src/config.rs

use dotenv::dotenv;
use ethers::types::Address;
use eyre::{Result, WrapErr};
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::driver::{DEFAULT_BATCH_SIZE, DEFAULT_RATE_BATCH_GAS_LIMIT};
use crate::oracle::DEFAULT_HERMES_URL;
use crate::transaction::{ConfirmSettings, TX_CONFIRMATION_TIMEOUT_SECS};

pub const DEFAULT_PORT: u16 = 5000;

/// Symbols whose addresses can be supplied as `<SYMBOL>_ADDRESS`.
pub const EXISTING_TOKEN_SYMBOLS: [&str; 4] = ["USDC", "USDT", "WETH", "DAI"];

#[derive(Debug, Clone)]
pub struct ChainConfig {
    // Network & Keys
    pub rpc_url: String,
    pub private_key: String,
    pub chain_id: Option<u64>,

    // Artifacts
    pub artifacts_dir: PathBuf,

    // Batching
    pub rate_batch_size: usize,
    pub rate_batch_gas_limit: u64,

    // Confirmation
    pub confirmation_timeout_secs: u64,
    pub confirmations: usize,

    // Contracts from an earlier run
    pub existing: ExistingDeployment,
}

impl ChainConfig {
    pub fn confirm_settings(&self) -> ConfirmSettings {
        ConfirmSettings {
            timeout: Duration::from_secs(self.confirmation_timeout_secs),
            confirmations: self.confirmations,
        }
    }
}

/// Router and token addresses produced by an earlier deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingDeployment {
    pub router: Option<Address>,
    pub tokens: BTreeMap<String, Address>,
}

/// Settings for the `/swapInfo` surface. `swap_address` stays `None` when
/// `SWAP_ADDRESS` is unset; the handler then answers with an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    pub swap_address: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: "0.0.0.0".to_string(), port: DEFAULT_PORT, swap_address: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleConfig {
    pub hermes_url: String,
    pub timeout: Duration,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self { hermes_url: DEFAULT_HERMES_URL.to_string(), timeout: Duration::from_secs(10) }
    }
}

fn env_nonempty(var_name: &str) -> Option<String> {
    env::var(var_name).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_env_or<T: std::str::FromStr>(var_name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env_nonempty(var_name) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| eyre::eyre!("{} has invalid value {:?}: {}", var_name, raw, e)),
        None => Ok(default),
    }
}

fn parse_optional_address(var_name: &str) -> Result<Option<Address>> {
    match env_nonempty(var_name) {
        Some(addr_str) => Ok(Some(
            addr_str
                .parse::<Address>()
                .wrap_err_with(|| format!("{} is not a valid address", var_name))?,
        )),
        None => Ok(None),
    }
}

pub fn load_existing_deployment() -> Result<ExistingDeployment> {
    let router = parse_optional_address("ROUTER_ADDRESS")?;
    let mut tokens = BTreeMap::new();
    for symbol in EXISTING_TOKEN_SYMBOLS {
        if let Some(address) = parse_optional_address(&format!("{}_ADDRESS", symbol))? {
            tokens.insert(symbol.to_string(), address);
        }
    }
    Ok(ExistingDeployment { router, tokens })
}

pub fn load_chain_config() -> Result<ChainConfig> {
    info!("Loading configuration from .env file...");
    dotenv().ok();

    let rpc_url = env::var("RPC_URL").wrap_err("RPC_URL must be set")?;
    let private_key = env::var("PRIVATE_KEY").wrap_err("PRIVATE_KEY must be set")?;
    let chain_id = match env_nonempty("CHAIN_ID") {
        Some(raw) => Some(raw.parse::<u64>().wrap_err("CHAIN_ID must be an integer")?),
        None => None,
    };
    let artifacts_dir = PathBuf::from(
        env_nonempty("ARTIFACTS_DIR").unwrap_or_else(|| "./artifacts".to_string()),
    );
    let rate_batch_size = parse_env_or("RATE_BATCH_SIZE", DEFAULT_BATCH_SIZE)?;
    let rate_batch_gas_limit = parse_env_or("RATE_BATCH_GAS_LIMIT", DEFAULT_RATE_BATCH_GAS_LIMIT)?;
    let confirmation_timeout_secs =
        parse_env_or("TX_CONFIRMATION_TIMEOUT_SECS", TX_CONFIRMATION_TIMEOUT_SECS)?;
    let confirmations = parse_env_or("TX_CONFIRMATIONS", 1usize)?;
    if rate_batch_size == 0 {
        eyre::bail!("RATE_BATCH_SIZE must be greater than zero");
    }
    let existing = load_existing_deployment()?;

    let config = ChainConfig {
        rpc_url, private_key, chain_id, artifacts_dir,
        rate_batch_size, rate_batch_gas_limit,
        confirmation_timeout_secs, confirmations, existing,
    };

    info!("✅ Configuration loaded successfully.");
    Ok(config)
}

impl ServerConfig {
    /// Never fails: a missing `SWAP_ADDRESS` is served as an empty value and
    /// an unparsable `PORT` falls back to the default.
    pub fn from_env() -> Self {
        dotenv().ok();
        let defaults = Self::default();
        Self {
            bind_addr: env_nonempty("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: env_nonempty("PORT").and_then(|p| p.parse().ok()).unwrap_or(defaults.port),
            swap_address: env_nonempty("SWAP_ADDRESS"),
        }
    }
}

impl OracleConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        let defaults = Self::default();
        let timeout_secs = parse_env_or("HERMES_TIMEOUT_SECS", defaults.timeout.as_secs())?;
        Ok(Self {
            hermes_url: env_nonempty("HERMES_URL").unwrap_or(defaults.hermes_url),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}
// END OF FILE: deployer/src/config.rs
