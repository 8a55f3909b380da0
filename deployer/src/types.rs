// deployer/src/types.rs

use chrono::{DateTime, Utc};
use ethers::types::{Address, TxHash, U256};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::utils::{serialize_u256_dec, short_address};

/// One directional exchange-rate entry for the router.
///
/// `rate` is whatever fixed-point convention the caller uses; it is never
/// interpreted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateUpdate {
    pub token_in: Address,
    pub token_out: Address,
    #[serde(serialize_with = "serialize_u256_dec")]
    pub rate: U256,
}

impl RateUpdate {
    pub fn new(token_in: Address, token_out: Address, rate: impl Into<U256>) -> Self {
        Self { token_in, token_out, rate: rate.into() }
    }

    pub fn is_self_pair(&self) -> bool {
        self.token_in == self.token_out
    }
}

impl fmt::Display for RateUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} @ {}",
            short_address(self.token_in),
            short_address(self.token_out),
            self.rate
        )
    }
}

/// Mint `amount` (minor units) of `token` to the funding recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingRequest {
    pub token: Address,
    pub amount: U256,
    /// Display label, usually the token symbol.
    pub label: Option<String>,
}

impl FundingRequest {
    pub fn new(token: Address, amount: impl Into<U256>) -> Self {
        Self { token, amount: amount.into(), label: None }
    }

    pub fn labelled(token: Address, amount: impl Into<U256>, label: impl Into<String>) -> Self {
        Self { token, amount: amount.into(), label: Some(label.into()) }
    }

    pub fn display_name(&self) -> String {
        self.label.clone().unwrap_or_else(|| format!("{:?}", self.token))
    }
}

/// A contiguous, size-bounded slice of the rate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Zero-based position in the full batch sequence.
    pub index: usize,
    pub updates: Vec<RateUpdate>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Splits the batch into the three parallel arrays the router expects.
    pub fn to_parallel_arrays(&self) -> (Vec<Address>, Vec<Address>, Vec<U256>) {
        let mut tokens_in = Vec::with_capacity(self.len());
        let mut tokens_out = Vec::with_capacity(self.len());
        let mut rates = Vec::with_capacity(self.len());
        for update in &self.updates {
            tokens_in.push(update.token_in);
            tokens_out.push(update.token_out);
            rates.push(update.rate);
        }
        (tokens_in, tokens_out, rates)
    }
}

/// Acknowledgement of a finalized remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Success,
    Failed,
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionStatus::Success => write!(f, "success"),
            SubmissionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of one batch submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    pub batch_index: usize,
    pub status: SubmissionStatus,
    pub error: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub tx_hash: Option<TxHash>,
    /// The entries carried by the batch, kept so failures can be resubmitted.
    pub updates: Vec<RateUpdate>,
}

impl SubmissionResult {
    pub fn is_success(&self) -> bool {
        self.status == SubmissionStatus::Success
    }

    pub fn size(&self) -> usize {
        self.updates.len()
    }
}

/// Outcome of one funding (mint) request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingResult {
    pub token: Address,
    pub label: Option<String>,
    pub amount: U256,
    pub status: SubmissionStatus,
    pub error: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub tx_hash: Option<TxHash>,
}

impl FundingResult {
    pub fn is_success(&self) -> bool {
        self.status == SubmissionStatus::Success
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedBatch {
    pub batch_index: usize,
    pub error: String,
    pub updates: Vec<RateUpdate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FundedToken {
    pub label: String,
    pub token: Address,
    #[serde(serialize_with = "serialize_u256_dec")]
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFunding {
    pub label: String,
    pub token: Address,
    #[serde(serialize_with = "serialize_u256_dec")]
    pub amount: U256,
    pub error: String,
}

/// Final reconciled view of a run. Built once by `driver::build_summary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSummary {
    pub deployed: BTreeMap<String, Address>,
    pub total_batches: usize,
    pub successful_batches: usize,
    pub applied_rates: usize,
    pub failed_rates: usize,
    pub failed_batches: Vec<FailedBatch>,
    pub funded_tokens: Vec<FundedToken>,
    pub failed_funding: Vec<FailedFunding>,
    pub completed_at: DateTime<Utc>,
}

impl DeploymentSummary {
    pub fn is_clean(&self) -> bool {
        self.failed_batches.is_empty() && self.failed_funding.is_empty()
    }
}

impl fmt::Display for DeploymentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{rule}")?;
        writeln!(f, "DEPLOYMENT SUMMARY")?;
        writeln!(f, "{rule}")?;
        for (name, address) in &self.deployed {
            writeln!(f, "   {name}: {address:?}")?;
        }
        writeln!(
            f,
            "\nRates applied: {} ({} of {} batches ok, {} rates failed)",
            self.applied_rates, self.successful_batches, self.total_batches, self.failed_rates
        )?;
        for failed in &self.failed_batches {
            writeln!(f, "   batch {} failed: {}", failed.batch_index + 1, failed.error)?;
            for update in &failed.updates {
                writeln!(f, "      {update}")?;
            }
        }
        writeln!(f, "Funded tokens: {}", self.funded_tokens.len())?;
        for funded in &self.funded_tokens {
            writeln!(f, "   {}: {} ({:?})", funded.label, funded.amount, funded.token)?;
        }
        for failed in &self.failed_funding {
            writeln!(f, "   {} NOT funded: {}", failed.label, failed.error)?;
        }
        writeln!(f, "Completed at: {}", self.completed_at.to_rfc3339())?;
        write!(f, "{rule}")
    }
}
