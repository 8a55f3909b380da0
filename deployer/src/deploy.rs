// deployer/src/deploy.rs

use async_trait::async_trait;
use ethers::{
    abi::Abi,
    prelude::ContractFactory as EthersContractFactory,
    types::{Address, Bytes},
    utils::hex,
};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::time::timeout;
use tracing::{info, instrument};

use crate::chain::SignerClient;
use crate::errors::LedgerError;
use crate::ledger::{ConstructorArgs, ContractFactory, ContractKind};
use crate::transaction::{confirmation_from_receipt, rejection_from_contract_error, ConfirmSettings};

/// Hardhat-style compiled contract (`abi` + `bytecode`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    #[serde(default)]
    pub contract_name: Option<String>,
    pub abi: Abi,
    pub bytecode: String,
}

impl ContractArtifact {
    pub fn from_json(json: &str) -> Result<Self, LedgerError> {
        serde_json::from_str(json)
            .map_err(|e| LedgerError::Artifact(format!("Failed to parse artifact JSON: {}", e)))
    }

    pub fn bytecode_bytes(&self) -> Result<Bytes, LedgerError> {
        let cleaned = self.bytecode.trim().trim_start_matches("0x");
        if cleaned.is_empty() {
            let name = self.contract_name.as_deref().unwrap_or("contract");
            return Err(LedgerError::Artifact(format!(
                "{} has no deployable bytecode (abstract or interface?)",
                name
            )));
        }
        let bytecode = hex::decode(cleaned)
            .map_err(|e| LedgerError::Artifact(format!("Failed to decode hex bytecode: {}", e)))?;
        Ok(Bytes::from(bytecode))
    }
}

/// Paths searched for `name`: a flat `<dir>/<name>.json`, then Hardhat's
/// `<dir>/contracts/<name>.sol/<name>.json`.
pub fn artifact_candidates(artifacts_dir: &Path, name: &str) -> [PathBuf; 2] {
    [
        artifacts_dir.join(format!("{}.json", name)),
        artifacts_dir
            .join("contracts")
            .join(format!("{}.sol", name))
            .join(format!("{}.json", name)),
    ]
}

pub fn load_artifact(
    artifacts_dir: &Path,
    kind: ContractKind,
) -> Result<ContractArtifact, LedgerError> {
    let name = kind.artifact_name();
    let path = artifact_candidates(artifacts_dir, name)
        .into_iter()
        .find(|p| p.is_file())
        .ok_or_else(|| {
            LedgerError::Artifact(format!("No artifact for {} under {:?}", name, artifacts_dir))
        })?;
    let json = fs::read_to_string(&path)
        .map_err(|e| LedgerError::Artifact(format!("Failed to read artifact {:?}: {}", path, e)))?;
    ContractArtifact::from_json(&json)
}

/// Deploys mock contracts from compiled artifacts and waits for the receipt.
#[derive(Debug, Clone)]
pub struct EthersDeployer {
    client: Arc<SignerClient>,
    artifacts_dir: PathBuf,
    confirm: ConfirmSettings,
}

impl EthersDeployer {
    pub fn new(
        client: Arc<SignerClient>,
        artifacts_dir: impl Into<PathBuf>,
        confirm: ConfirmSettings,
    ) -> Self {
        Self { client, artifacts_dir: artifacts_dir.into(), confirm }
    }
}

#[async_trait]
impl ContractFactory for EthersDeployer {
    #[instrument(skip(self, args), fields(contract = %kind))]
    async fn deploy(
        &self,
        kind: ContractKind,
        args: ConstructorArgs,
    ) -> Result<Address, LedgerError> {
        let artifact = load_artifact(&self.artifacts_dir, kind)?;
        let bytecode = artifact.bytecode_bytes()?;
        let factory = EthersContractFactory::new(artifact.abi, bytecode, self.client.clone());

        let deployer = match args {
            ConstructorArgs::None => factory.deploy(()),
            ConstructorArgs::Token { name, symbol, decimals, initial_supply, faucet_amount } => {
                factory.deploy((name, symbol, decimals, initial_supply, faucet_amount))
            }
        }
        .map_err(|e| LedgerError::Artifact(format!("Failed to construct deployment call: {}", e)))?
        .confirmations(self.confirm.confirmations);

        info!("Sending deployment transaction...");
        let sent = timeout(self.confirm.timeout, deployer.send_with_receipt()).await;
        let (contract, receipt) = match sent {
            Ok(Ok(deployed)) => deployed,
            Ok(Err(e)) => return Err(rejection_from_contract_error(&e)),
            Err(_) => return Err(LedgerError::Timeout(self.confirm.timeout.as_secs())),
        };
        confirmation_from_receipt(&receipt)?;

        let address = contract.address();
        info!(address = ?address, tx = ?receipt.transaction_hash, "Contract deployed");
        Ok(address)
    }
}
