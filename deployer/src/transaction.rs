// deployer/src/transaction.rs

use ethers::{
    abi::Detokenize,
    contract::{ContractCall, ContractError},
    providers::Middleware,
    types::{TransactionReceipt, U64},
};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, instrument};

use crate::errors::LedgerError;
use crate::types::Confirmation;

// --- Constants ---
pub const TX_CONFIRMATION_TIMEOUT_SECS: u64 = 90;
const TX_SUCCESS_STATUS: U64 = U64([1]);

/// How long and how deep to wait for a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmSettings {
    pub timeout: Duration,
    pub confirmations: usize,
}

impl Default for ConfirmSettings {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(TX_CONFIRMATION_TIMEOUT_SECS), confirmations: 1 }
    }
}

/// Sends a contract call and blocks until it is mined with `status == 1`.
///
/// Every failure mode (send error, timeout, dropped tx, on-chain revert) maps
/// to a `LedgerError`; nothing is retried here.
#[instrument(skip_all, level = "debug", fields(timeout_secs = settings.timeout.as_secs()))]
pub async fn send_and_confirm<M, D>(
    call: ContractCall<M, D>,
    settings: &ConfirmSettings,
) -> Result<Confirmation, LedgerError>
where
    M: Middleware + 'static,
    D: Detokenize,
{
    let pending = call.send().await.map_err(|e| rejection_from_contract_error(&e))?;
    let tx_hash = pending.tx_hash();
    debug!(?tx_hash, "Transaction sent, waiting for receipt...");

    let waited = timeout(settings.timeout, pending.confirmations(settings.confirmations)).await;
    let receipt = match waited {
        Ok(Ok(Some(receipt))) => receipt,
        Ok(Ok(None)) => {
            error!(?tx_hash, "Receipt not found (dropped?)");
            return Err(LedgerError::Dropped(tx_hash));
        }
        Ok(Err(e)) => {
            error!(?tx_hash, error = %e, "Error waiting for receipt");
            return Err(LedgerError::Provider(e.to_string()));
        }
        Err(_) => {
            error!(?tx_hash, "Timeout waiting for receipt ({}s)", settings.timeout.as_secs());
            return Err(LedgerError::Timeout(settings.timeout.as_secs()));
        }
    };

    confirmation_from_receipt(&receipt)
}

/// Accepts only successful receipts.
pub fn confirmation_from_receipt(
    receipt: &TransactionReceipt,
) -> Result<Confirmation, LedgerError> {
    if receipt.status != Some(TX_SUCCESS_STATUS) {
        return Err(LedgerError::Reverted(receipt.transaction_hash));
    }
    debug!(
        tx_hash = ?receipt.transaction_hash,
        block = receipt.block_number.unwrap_or_default().as_u64(),
        gas_used = %receipt.gas_used.unwrap_or_default(),
        "TX confirmed"
    );
    Ok(Confirmation {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number.map(|b| b.as_u64()),
        gas_used: receipt.gas_used,
    })
}

/// Prefers the decoded `Error(string)` revert reason when the node returns one.
pub fn rejection_from_contract_error<M: Middleware>(err: &ContractError<M>) -> LedgerError {
    match err.decode_revert::<String>() {
        Some(reason) => LedgerError::Rejected(format!("execution reverted: {}", reason)),
        None => LedgerError::Rejected(err.to_string()),
    }
}
