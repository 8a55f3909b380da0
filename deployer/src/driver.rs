// deployer/src/driver.rs
//! Batch configuration driver.
//!
//! Splits a rate table into bounded batches, submits them one at a time and
//! records an outcome per batch. Failures of individual batches or mints are
//! recorded and the run moves on; nothing is retried and nothing already
//! applied is rolled back.

use chrono::Utc;
use ethers::types::{Address, U256};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use tracing::{error, info, instrument, warn};

use crate::errors::{DriverError, LedgerError};
use crate::ledger::RemoteLedger;
use crate::types::{
    Batch, DeploymentSummary, FailedBatch, FailedFunding, FundedToken, FundingRequest,
    FundingResult, RateUpdate, SubmissionResult, SubmissionStatus,
};

pub const DEFAULT_BATCH_SIZE: usize = 4;
pub const DEFAULT_RATE_BATCH_GAS_LIMIT: u64 = 700_000;

/// Ordered, exact-cover partition of `updates` into batches of at most
/// `batch_size` entries.
pub fn partition_into_batches(updates: &[RateUpdate], batch_size: NonZeroUsize) -> Vec<Batch> {
    updates
        .chunks(batch_size.get())
        .enumerate()
        .map(|(index, chunk)| Batch { index, updates: chunk.to_vec() })
        .collect()
}

pub fn validate_settings(batch_size: usize, gas_limit: u64) -> Result<NonZeroUsize, DriverError> {
    let batch_size =
        NonZeroUsize::new(batch_size).ok_or(DriverError::InvalidBatchSize(batch_size))?;
    if gas_limit == 0 {
        return Err(DriverError::ZeroGasLimit);
    }
    Ok(batch_size)
}

pub fn validate_rate_updates(updates: &[RateUpdate]) -> Result<(), DriverError> {
    for (index, update) in updates.iter().enumerate() {
        if update.token_in.is_zero() || update.token_out.is_zero() {
            return Err(DriverError::ZeroRateAddress { index });
        }
        if update.is_self_pair() {
            return Err(DriverError::SelfPair { index, token: update.token_in });
        }
    }
    Ok(())
}

pub fn validate_funding_requests(
    recipient: Address,
    requests: &[FundingRequest],
) -> Result<(), DriverError> {
    if recipient.is_zero() {
        return Err(DriverError::ZeroRecipient);
    }
    for (index, request) in requests.iter().enumerate() {
        if request.token.is_zero() {
            return Err(DriverError::ZeroFundingToken { index });
        }
        if request.amount.is_zero() {
            return Err(DriverError::ZeroAmount { index, token: request.token });
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct BatchDriver<L> {
    ledger: L,
    batch_size: NonZeroUsize,
    gas_limit: U256,
}

impl<L: RemoteLedger> BatchDriver<L> {
    /// Fails fast on a zero batch size or gas limit; no remote call is made.
    pub fn new(ledger: L, batch_size: usize, gas_limit: u64) -> Result<Self, DriverError> {
        let batch_size = validate_settings(batch_size, gas_limit)?;
        Ok(Self { ledger, batch_size, gas_limit: U256::from(gas_limit) })
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.get()
    }

    pub fn gas_limit(&self) -> U256 {
        self.gas_limit
    }

    /// Submits one batch and waits for its confirmation.
    ///
    /// Remote rejections come back as a `Failed` result with the ledger's
    /// message; only caller-side faults are returned as `Err`.
    #[instrument(skip(self, batch), fields(batch = batch.index + 1, size = batch.len()))]
    pub async fn submit_batch(
        &self,
        batch: &Batch,
        gas_limit: U256,
    ) -> Result<SubmissionResult, DriverError> {
        let (tokens_in, tokens_out, rates) = batch.to_parallel_arrays();
        let outcome = self
            .ledger
            .submit_rate_update_batch(tokens_in, tokens_out, rates, gas_limit)
            .await;

        match outcome {
            Ok(confirmation) => Ok(SubmissionResult {
                batch_index: batch.index,
                status: SubmissionStatus::Success,
                error: None,
                confirmed_at: Some(Utc::now()),
                tx_hash: Some(confirmation.tx_hash),
                updates: batch.updates.clone(),
            }),
            Err(err) if err.is_caller_fault() => Err(DriverError::MalformedCall(err.to_string())),
            Err(err) => Ok(SubmissionResult {
                batch_index: batch.index,
                status: SubmissionStatus::Failed,
                error: Some(err.to_string()),
                confirmed_at: None,
                tx_hash: None,
                updates: batch.updates.clone(),
            }),
        }
    }

    /// Attempts every batch exactly once, in order, continuing past failures.
    pub async fn run_all(
        &self,
        updates: &[RateUpdate],
    ) -> Result<Vec<SubmissionResult>, DriverError> {
        validate_rate_updates(updates)?;

        let batches = partition_into_batches(updates, self.batch_size);
        let total = batches.len();
        info!(
            rates = updates.len(),
            batches = total,
            batch_size = self.batch_size(),
            "Setting exchange rates"
        );

        let mut results = Vec::with_capacity(total);
        for batch in &batches {
            info!("Setting rates batch {}/{}...", batch.index + 1, total);
            let result = self.submit_batch(batch, self.gas_limit).await?;
            match &result.error {
                None => info!(tx = ?result.tx_hash, "Batch {} configured", batch.index + 1),
                Some(message) => {
                    error!(error = %message, "Error in batch {}", batch.index + 1);
                    for update in &batch.updates {
                        warn!(batch = batch.index + 1, pair = %update, "Rate not applied");
                    }
                }
            }
            results.push(result);
        }
        Ok(results)
    }

    /// Mints every request to `recipient`, one at a time, recording each
    /// outcome independently. All requests are validated before the first mint.
    pub async fn fund_all(
        &self,
        recipient: Address,
        requests: &[FundingRequest],
    ) -> Result<Vec<FundingResult>, DriverError> {
        validate_funding_requests(recipient, requests)?;
        info!(
            recipient = ?recipient,
            requests = requests.len(),
            "Funding recipient with liquidity"
        );

        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let name = request.display_name();
            let outcome = self.ledger.mint(request.token, recipient, request.amount).await;
            let result = match outcome {
                Ok(confirmation) => {
                    info!(tx = ?confirmation.tx_hash, "{} funded", name);
                    FundingResult {
                        token: request.token,
                        label: request.label.clone(),
                        amount: request.amount,
                        status: SubmissionStatus::Success,
                        error: None,
                        confirmed_at: Some(Utc::now()),
                        tx_hash: Some(confirmation.tx_hash),
                    }
                }
                Err(err) if err.is_caller_fault() => {
                    return Err(DriverError::MalformedCall(err.to_string()))
                }
                Err(err) => {
                    error!(
                        token = ?request.token,
                        amount = %request.amount,
                        error = %err,
                        "Failed to fund {}",
                        name
                    );
                    failed_funding(request, &err)
                }
            };
            results.push(result);
        }
        Ok(results)
    }
}

fn failed_funding(request: &FundingRequest, err: &LedgerError) -> FundingResult {
    FundingResult {
        token: request.token,
        label: request.label.clone(),
        amount: request.amount,
        status: SubmissionStatus::Failed,
        error: Some(err.to_string()),
        confirmed_at: None,
        tx_hash: None,
    }
}

/// Pure aggregation of a run's outcomes.
pub fn build_summary(
    deployed: BTreeMap<String, Address>,
    rate_results: &[SubmissionResult],
    funding_results: &[FundingResult],
) -> DeploymentSummary {
    let mut successful_batches = 0;
    let mut applied_rates = 0;
    let mut failed_rates = 0;
    let mut failed_batches = Vec::new();

    for result in rate_results {
        if result.is_success() {
            successful_batches += 1;
            applied_rates += result.size();
        } else {
            failed_rates += result.size();
            failed_batches.push(FailedBatch {
                batch_index: result.batch_index,
                error: result.error.clone().unwrap_or_default(),
                updates: result.updates.clone(),
            });
        }
    }

    let mut funded_tokens = Vec::new();
    let mut failed_funding = Vec::new();
    for result in funding_results {
        let label = result.label.clone().unwrap_or_else(|| format!("{:?}", result.token));
        if result.is_success() {
            funded_tokens.push(FundedToken { label, token: result.token, amount: result.amount });
        } else {
            failed_funding.push(FailedFunding {
                label,
                token: result.token,
                amount: result.amount,
                error: result.error.clone().unwrap_or_default(),
            });
        }
    }

    DeploymentSummary {
        deployed,
        total_batches: rate_results.len(),
        successful_batches,
        applied_rates,
        failed_rates,
        failed_batches,
        funded_tokens,
        failed_funding,
        completed_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    #[test]
    fn partition_keeps_remainder_in_last_batch() {
        let updates: Vec<_> = (1..=7).map(|i| RateUpdate::new(addr(i), addr(i + 100), i)).collect();
        let batches = partition_into_batches(&updates, NonZeroUsize::new(3).unwrap());
        let sizes: Vec<_> = batches.iter().map(Batch::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(batches[2].index, 2);
        assert_eq!(batches[2].updates[0], updates[6]);
    }

    #[test]
    fn self_pair_is_rejected_with_its_position() {
        let updates = vec![
            RateUpdate::new(addr(1), addr(2), 10u64),
            RateUpdate::new(addr(3), addr(3), 10u64),
        ];
        assert_eq!(
            validate_rate_updates(&updates),
            Err(DriverError::SelfPair { index: 1, token: addr(3) })
        );
    }

    #[test]
    fn zero_recipient_is_rejected_even_without_requests() {
        assert_eq!(
            validate_funding_requests(Address::zero(), &[]),
            Err(DriverError::ZeroRecipient)
        );
    }
}
