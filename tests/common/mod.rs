// tests/common/mod.rs
// In-memory stand-ins for the chain, shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use ethers::types::{Address, TxHash, U256};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

use mockswap_deployer::{
    Confirmation, ConstructorArgs, ContractFactory, ContractKind, LedgerError, RateUpdate,
    RemoteLedger,
};

pub fn setup_tracing() {
    let _ = fmt()
        .with_max_level(LevelFilter::DEBUG)
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

/// `count` distinct, non-self rate entries.
pub fn rate_table(count: u64) -> Vec<RateUpdate> {
    (1..=count).map(|i| RateUpdate::new(addr(i), addr(i + 1_000), i * 10)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedBatch {
    pub tokens_in: Vec<Address>,
    pub tokens_out: Vec<Address>,
    pub rates: Vec<U256>,
    pub gas_limit: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMint {
    pub token: Address,
    pub recipient: Address,
    pub amount: U256,
}

/// Records every call; individual calls can be scripted to fail.
#[derive(Debug, Default)]
pub struct MockLedger {
    pub batches: Mutex<Vec<RecordedBatch>>,
    pub mints: Mutex<Vec<RecordedMint>>,
    balances: Mutex<HashMap<(Address, Address), U256>>,
    /// Zero-based batch call numbers that come back with the given error.
    batch_failures: HashMap<usize, LedgerError>,
    mint_failures: HashMap<Address, LedgerError>,
    unreadable_balances: HashSet<Address>,
    next_hash: Mutex<u64>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_batch(mut self, call: usize, err: LedgerError) -> Self {
        self.batch_failures.insert(call, err);
        self
    }

    pub fn fail_mint(mut self, token: Address, err: LedgerError) -> Self {
        self.mint_failures.insert(token, err);
        self
    }

    pub fn unreadable_balance(mut self, token: Address) -> Self {
        self.unreadable_balances.insert(token);
        self
    }

    pub fn batch_calls(&self) -> Vec<RecordedBatch> {
        self.batches.lock().unwrap().clone()
    }

    pub fn mint_calls(&self) -> Vec<RecordedMint> {
        self.mints.lock().unwrap().clone()
    }

    pub fn balance(&self, token: Address, owner: Address) -> U256 {
        self.balances.lock().unwrap().get(&(token, owner)).copied().unwrap_or_default()
    }

    fn confirmation(&self) -> Confirmation {
        let mut next = self.next_hash.lock().unwrap();
        *next += 1;
        Confirmation {
            tx_hash: TxHash::from_low_u64_be(*next),
            block_number: Some(*next),
            gas_used: None,
        }
    }
}

#[async_trait]
impl RemoteLedger for MockLedger {
    async fn submit_rate_update_batch(
        &self,
        tokens_in: Vec<Address>,
        tokens_out: Vec<Address>,
        rates: Vec<U256>,
        gas_limit: U256,
    ) -> Result<Confirmation, LedgerError> {
        let call = {
            let mut batches = self.batches.lock().unwrap();
            batches.push(RecordedBatch { tokens_in, tokens_out, rates, gas_limit });
            batches.len() - 1
        };
        match self.batch_failures.get(&call) {
            Some(err) => Err(err.clone()),
            None => Ok(self.confirmation()),
        }
    }

    async fn mint(
        &self,
        token: Address,
        recipient: Address,
        amount: U256,
    ) -> Result<Confirmation, LedgerError> {
        self.mints.lock().unwrap().push(RecordedMint { token, recipient, amount });
        if let Some(err) = self.mint_failures.get(&token) {
            return Err(err.clone());
        }
        *self.balances.lock().unwrap().entry((token, recipient)).or_default() += amount;
        Ok(self.confirmation())
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, LedgerError> {
        if self.unreadable_balances.contains(&token) {
            return Err(LedgerError::Provider("balance unavailable".to_string()));
        }
        Ok(self.balance(token, owner))
    }
}

/// Hands out sequential addresses starting at 0x1000.
#[derive(Debug, Default)]
pub struct MockFactory {
    pub deployed: Mutex<Vec<(ContractKind, ConstructorArgs, Address)>>,
    fail_kind: Option<ContractKind>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(kind: ContractKind) -> Self {
        Self { fail_kind: Some(kind), ..Self::default() }
    }

    pub fn calls(&self) -> Vec<(ContractKind, ConstructorArgs, Address)> {
        self.deployed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContractFactory for MockFactory {
    async fn deploy(
        &self,
        kind: ContractKind,
        args: ConstructorArgs,
    ) -> Result<Address, LedgerError> {
        if self.fail_kind == Some(kind) {
            return Err(LedgerError::Rejected(format!("{} deployment reverted", kind)));
        }
        let mut deployed = self.deployed.lock().unwrap();
        let address = addr(0x1000 + deployed.len() as u64);
        deployed.push((kind, args, address));
        Ok(address)
    }
}
