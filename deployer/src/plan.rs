// deployer/src/plan.rs
//! Deployment plans: which tokens to deploy or reuse, the router, the rate
//! table and the funding table, all as data keyed by token symbol.

use ethers::types::{Address, U256};
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fs, path::Path};

use crate::config::ExistingDeployment;
use crate::errors::PlanError;
use crate::ledger::ConstructorArgs;
use crate::types::{FundingRequest, RateUpdate};
use crate::utils::parse_token_amount;

pub const STABLE_PARITY_RATE: u128 = 10_000;
pub const STABLE_TO_WETH_RATE: u128 = 4_000_000_000_000;
pub const WETH_TO_STABLE_RATE: u128 = 25_000;

/// A mock ERC-20 to deploy. Amounts are human-readable, scaled by `decimals`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSpec {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub initial_supply: String,
    pub faucet_amount: String,
}

impl TokenSpec {
    pub fn new(
        name: &str,
        symbol: &str,
        decimals: u8,
        initial_supply: &str,
        faucet_amount: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
            initial_supply: initial_supply.to_string(),
            faucet_amount: faucet_amount.to_string(),
        }
    }

    pub fn constructor_args(&self) -> Result<ConstructorArgs, PlanError> {
        Ok(ConstructorArgs::Token {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            decimals: self.decimals,
            initial_supply: scaled(&self.symbol, &self.initial_supply, self.decimals)?,
            faucet_amount: scaled(&self.symbol, &self.faucet_amount, self.decimals)?,
        })
    }
}

/// A token already on-chain that the plan refers to by symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingToken {
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSpec {
    pub token_in: String,
    pub token_out: String,
    pub rate: u128,
}

impl RateSpec {
    pub fn new(token_in: &str, token_out: &str, rate: u128) -> Self {
        Self { token_in: token_in.to_string(), token_out: token_out.to_string(), rate }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingSpec {
    pub symbol: String,
    pub amount: String,
}

impl FundingSpec {
    pub fn new(symbol: &str, amount: &str) -> Self {
        Self { symbol: symbol.to_string(), amount: amount.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentPlan {
    pub name: String,
    #[serde(default)]
    pub deploy_tokens: Vec<TokenSpec>,
    #[serde(default)]
    pub existing_tokens: Vec<ExistingToken>,
    /// Existing router to configure; a new one is deployed when absent.
    #[serde(default)]
    pub router: Option<Address>,
    #[serde(default)]
    pub rates: Vec<RateSpec>,
    #[serde(default)]
    pub funding: Vec<FundingSpec>,
}

/// Every ordered pair of distinct symbols at the same rate.
pub fn stable_mesh(symbols: &[String], rate: u128) -> Vec<RateSpec> {
    let mut rates = Vec::new();
    for token_in in symbols {
        for token_out in symbols {
            if token_in != token_out {
                rates.push(RateSpec::new(token_in, token_out, rate));
            }
        }
    }
    rates
}

/// `symbol -> base` and `base -> symbol` for each symbol, interleaved.
pub fn paired_with(
    base: &str,
    symbols: &[String],
    to_base: u128,
    from_base: u128,
) -> Vec<RateSpec> {
    symbols
        .iter()
        .flat_map(|symbol| {
            [RateSpec::new(symbol, base, to_base), RateSpec::new(base, symbol, from_base)]
        })
        .collect()
}

fn existing_token(
    plan: &str,
    existing: &ExistingDeployment,
    symbol: &str,
    decimals: u8,
) -> Result<ExistingToken, PlanError> {
    let address =
        existing.tokens.get(symbol).copied().ok_or_else(|| PlanError::MissingExistingToken {
            plan: plan.to_string(),
            symbol: symbol.to_string(),
        })?;
    Ok(ExistingToken { symbol: symbol.to_string(), address, decimals })
}

fn reference_tokens(
    plan: &str,
    existing: &ExistingDeployment,
) -> Result<Vec<ExistingToken>, PlanError> {
    Ok(vec![
        existing_token(plan, existing, "USDC", 6)?,
        existing_token(plan, existing, "USDT", 6)?,
        existing_token(plan, existing, "WETH", 18)?,
        existing_token(plan, existing, "DAI", 18)?,
    ])
}

impl DeploymentPlan {
    /// USDC/USDT/WETH/DAI plus a fresh router, 12 rates, router liquidity.
    pub fn core() -> Self {
        let rates = vec![
            RateSpec::new("USDC", "USDT", 9995),
            RateSpec::new("USDC", "WETH", 4),
            RateSpec::new("USDC", "DAI", 10_000_000_000_000),
            RateSpec::new("USDT", "USDC", 10005),
            RateSpec::new("USDT", "WETH", 4),
            RateSpec::new("USDT", "DAI", 10_000_000_000_000),
            RateSpec::new("WETH", "USDC", 25_000_000),
            RateSpec::new("WETH", "USDT", 25_000_000),
            RateSpec::new("WETH", "DAI", 2500),
            RateSpec::new("DAI", "USDC", 1),
            RateSpec::new("DAI", "USDT", 1),
            RateSpec::new("DAI", "WETH", 4),
        ];
        Self {
            name: "core".to_string(),
            deploy_tokens: vec![
                TokenSpec::new("Mock USD Coin", "USDC", 6, "1000000", "1000"),
                TokenSpec::new("Mock Tether", "USDT", 6, "1000000", "1000"),
                TokenSpec::new("Mock Wrapped Ether", "WETH", 18, "10000", "10"),
                TokenSpec::new("Mock Dai Stablecoin", "DAI", 18, "1000000", "1000"),
            ],
            existing_tokens: Vec::new(),
            router: None,
            rates,
            funding: core_funding(),
        }
    }

    /// Seven extra 6-decimal stables wired into an existing router: a 1:1
    /// mesh over all stables plus a pair with WETH for each.
    pub fn extra_stables(existing: &ExistingDeployment) -> Result<Self, PlanError> {
        let name = "extra-stables";
        let router = existing.router.ok_or_else(|| PlanError::MissingRouter(name.to_string()))?;
        let existing_tokens = reference_tokens(name, existing)?;

        let deploy_tokens = vec![
            TokenSpec::new("Mock First Digital USD", "FDUSD", 6, "1000000", "1000"),
            TokenSpec::new("Mock Binance USD", "BUSD", 6, "1000000", "1000"),
            TokenSpec::new("Mock TrueUSD", "TUSD", 6, "1000000", "1000"),
            TokenSpec::new("Mock Pax Dollar", "USDP", 6, "1000000", "1000"),
            TokenSpec::new("Mock PayPal USD", "PYUSD", 6, "1000000", "1000"),
            TokenSpec::new("Mock USDD Stablecoin", "USDD", 6, "1000000", "1000"),
            TokenSpec::new("Mock Gemini Dollar", "GUSD", 6, "1000000", "1000"),
        ];

        let mut stables: Vec<String> =
            ["USDC", "USDT", "DAI"].iter().map(|s| s.to_string()).collect();
        stables.extend(deploy_tokens.iter().map(|t| t.symbol.clone()));

        let mut rates = stable_mesh(&stables, STABLE_PARITY_RATE);
        rates.extend(paired_with("WETH", &stables, STABLE_TO_WETH_RATE, WETH_TO_STABLE_RATE));

        let funding = deploy_tokens.iter().map(|t| FundingSpec::new(&t.symbol, "50000")).collect();

        Ok(Self {
            name: name.to_string(),
            deploy_tokens,
            existing_tokens,
            router: Some(router),
            rates,
            funding,
        })
    }

    /// Tops up an existing router with the core liquidity amounts.
    pub fn fund_router(existing: &ExistingDeployment) -> Result<Self, PlanError> {
        let name = "fund-router";
        let router = existing.router.ok_or_else(|| PlanError::MissingRouter(name.to_string()))?;
        Ok(Self {
            name: name.to_string(),
            deploy_tokens: Vec::new(),
            existing_tokens: reference_tokens(name, existing)?,
            router: Some(router),
            rates: Vec::new(),
            funding: core_funding(),
        })
    }

    /// Resolves a built-in plan name, or reads a JSON plan file.
    pub fn load(name_or_path: &str, existing: &ExistingDeployment) -> Result<Self> {
        let plan = match name_or_path {
            "core" => Self::core(),
            "extra-stables" => Self::extra_stables(existing)?,
            "fund-router" => Self::fund_router(existing)?,
            path => Self::from_file(path)?,
        };
        Ok(plan)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read plan file {:?}", path))?;
        serde_json::from_str(&json)
            .wrap_err_with(|| format!("Failed to parse plan file {:?}", path))
    }

    /// Static checks that need no chain access: every referenced symbol is
    /// declared exactly once, no configured address is zero, no self-pairs,
    /// all amounts parse and funding amounts are positive.
    pub fn check(&self) -> Result<(), PlanError> {
        let zero_address = |symbol: &str| PlanError::ZeroAddress {
            plan: self.name.clone(),
            symbol: symbol.to_string(),
        };
        if self.router.is_some_and(|router| router.is_zero()) {
            return Err(zero_address("router"));
        }
        if let Some(token) = self.existing_tokens.iter().find(|t| t.address.is_zero()) {
            return Err(zero_address(&token.symbol));
        }

        let mut declared = BTreeMap::new();
        for token in &self.deploy_tokens {
            token.constructor_args()?;
            if declared.insert(token.symbol.as_str(), token.decimals).is_some() {
                return Err(PlanError::DuplicateSymbol(token.symbol.clone()));
            }
        }
        for token in &self.existing_tokens {
            if declared.insert(token.symbol.as_str(), token.decimals).is_some() {
                return Err(PlanError::DuplicateSymbol(token.symbol.clone()));
            }
        }

        let unknown = |symbol: &str| PlanError::UnknownSymbol {
            plan: self.name.clone(),
            symbol: symbol.to_string(),
        };
        for rate in &self.rates {
            for symbol in [&rate.token_in, &rate.token_out] {
                if !declared.contains_key(symbol.as_str()) {
                    return Err(unknown(symbol.as_str()));
                }
            }
            if rate.token_in == rate.token_out {
                return Err(PlanError::SelfPair {
                    plan: self.name.clone(),
                    symbol: rate.token_in.clone(),
                });
            }
        }
        for funding in &self.funding {
            let decimals = *declared
                .get(funding.symbol.as_str())
                .ok_or_else(|| unknown(funding.symbol.as_str()))?;
            positive(&funding.symbol, &funding.amount, decimals)?;
        }
        Ok(())
    }
}

fn core_funding() -> Vec<FundingSpec> {
    vec![
        FundingSpec::new("USDC", "100000"),
        FundingSpec::new("USDT", "100000"),
        FundingSpec::new("WETH", "50"),
        FundingSpec::new("DAI", "100000"),
    ]
}

fn scaled(symbol: &str, amount: &str, decimals: u8) -> Result<U256, PlanError> {
    parse_token_amount(amount, decimals).map_err(|e| PlanError::InvalidAmount {
        symbol: symbol.to_string(),
        amount: amount.to_string(),
        reason: e.to_string(),
    })
}

fn positive(symbol: &str, amount: &str, decimals: u8) -> Result<U256, PlanError> {
    let value = scaled(symbol, amount, decimals)?;
    if value.is_zero() {
        return Err(PlanError::InvalidAmount {
            symbol: symbol.to_string(),
            amount: amount.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenEntry {
    pub address: Address,
    pub decimals: u8,
}

/// Symbol -> on-chain token, filled from existing tokens and fresh deploys.
#[derive(Debug, Clone, Default)]
pub struct AddressBook {
    entries: BTreeMap<String, TokenEntry>,
}

impl AddressBook {
    pub fn insert(
        &mut self,
        symbol: &str,
        address: Address,
        decimals: u8,
    ) -> Result<(), PlanError> {
        if self.entries.contains_key(symbol) {
            return Err(PlanError::DuplicateSymbol(symbol.to_string()));
        }
        self.entries.insert(symbol.to_string(), TokenEntry { address, decimals });
        Ok(())
    }

    pub fn get(&self, symbol: &str) -> Option<TokenEntry> {
        self.entries.get(symbol).copied()
    }

    fn lookup(&self, plan: &str, symbol: &str) -> Result<TokenEntry, PlanError> {
        self.get(symbol).ok_or_else(|| PlanError::UnknownSymbol {
            plan: plan.to_string(),
            symbol: symbol.to_string(),
        })
    }

    pub fn resolve_rates(
        &self,
        plan: &str,
        rates: &[RateSpec],
    ) -> Result<Vec<RateUpdate>, PlanError> {
        rates
            .iter()
            .map(|spec| {
                let token_in = self.lookup(plan, &spec.token_in)?.address;
                let token_out = self.lookup(plan, &spec.token_out)?.address;
                Ok(RateUpdate::new(token_in, token_out, U256::from(spec.rate)))
            })
            .collect()
    }

    pub fn resolve_funding(
        &self,
        plan: &str,
        funding: &[FundingSpec],
    ) -> Result<Vec<FundingRequest>, PlanError> {
        funding
            .iter()
            .map(|spec| {
                let entry = self.lookup(plan, &spec.symbol)?;
                let amount = positive(&spec.symbol, &spec.amount, entry.decimals)?;
                Ok(FundingRequest::labelled(entry.address, amount, spec.symbol.clone()))
            })
            .collect()
    }
}
