// deployer/src/workflow.rs
//! The one deployment workflow every plan runs through:
//! check plan -> deploy tokens -> deploy/attach router -> rates -> funding -> summary.

use ethers::types::Address;
use eyre::{Result, WrapErr};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

use crate::driver::{build_summary, validate_settings, BatchDriver};
use crate::ledger::{ConstructorArgs, ContractFactory, ContractKind, RemoteLedger};
use crate::plan::{AddressBook, DeploymentPlan};
use crate::types::{DeploymentSummary, FundingRequest};
use crate::utils::format_units;

pub const ROUTER_LABEL: &str = "Router";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowSettings {
    pub batch_size: usize,
    pub gas_limit: u64,
}

/// Network facts printed alongside the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunContext {
    pub chain_id: u64,
    pub deployer: Address,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReport {
    pub plan: String,
    #[serde(flatten)]
    pub context: RunContext,
    pub router: Address,
    pub summary: DeploymentSummary,
}

impl fmt::Display for DeploymentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Plan: {} | chain {} | deployer {:?}",
            self.plan, self.context.chain_id, self.context.deployer
        )?;
        writeln!(f, "{}", self.summary)?;
        write!(f, "Router: {:?}", self.router)
    }
}

/// Runs `plan` end to end.
///
/// `bind_ledger` receives the router address once it is known (deployed or
/// taken from the plan) and returns the ledger used for rates and funding.
/// Plan and driver configuration errors abort before any remote call; a
/// failed deployment aborts the run; rate batches and mints are best-effort.
pub async fn run_plan<F, L, B>(
    plan: &DeploymentPlan,
    factory: &F,
    bind_ledger: B,
    settings: WorkflowSettings,
    context: RunContext,
) -> Result<DeploymentReport>
where
    F: ContractFactory,
    L: RemoteLedger,
    B: FnOnce(Address) -> L,
{
    plan.check().wrap_err_with(|| format!("Plan '{}' is invalid", plan.name))?;
    validate_settings(settings.batch_size, settings.gas_limit)?;
    info!(
        plan = %plan.name,
        chain_id = context.chain_id,
        deployer = ?context.deployer,
        "Running deployment plan"
    );

    let mut book = AddressBook::default();
    for token in &plan.existing_tokens {
        book.insert(&token.symbol, token.address, token.decimals)?;
    }
    let mut deployed = BTreeMap::new();

    if !plan.deploy_tokens.is_empty() {
        info!("Deploying {} mock tokens...", plan.deploy_tokens.len());
    }
    for token in &plan.deploy_tokens {
        info!("Deploying {}...", token.symbol);
        let address = factory
            .deploy(ContractKind::MockToken, token.constructor_args()?)
            .await
            .wrap_err_with(|| format!("Failed to deploy {}", token.symbol))?;
        info!("✅ {} deployed at: {:?}", token.symbol, address);
        book.insert(&token.symbol, address, token.decimals)?;
        deployed.insert(token.symbol.clone(), address);
    }

    let router = match plan.router {
        Some(existing) => {
            info!("Using existing router at: {:?}", existing);
            existing
        }
        None => {
            info!("Deploying mock router...");
            let address = factory
                .deploy(ContractKind::MockRouter, ConstructorArgs::None)
                .await
                .wrap_err("Failed to deploy mock router")?;
            info!("✅ Router deployed at: {:?}", address);
            address
        }
    };
    deployed.insert(ROUTER_LABEL.to_string(), router);

    let updates = book.resolve_rates(&plan.name, &plan.rates)?;
    let funding = book.resolve_funding(&plan.name, &plan.funding)?;

    let driver = BatchDriver::new(bind_ledger(router), settings.batch_size, settings.gas_limit)?;

    let rate_results = if updates.is_empty() {
        Vec::new()
    } else {
        driver.run_all(&updates).await?
    };

    log_balances(driver.ledger(), &book, &funding, router, "Current").await;
    let funding_results = if funding.is_empty() {
        Vec::new()
    } else {
        driver.fund_all(router, &funding).await?
    };
    log_balances(driver.ledger(), &book, &funding, router, "Updated").await;

    let summary = build_summary(deployed, &rate_results, &funding_results);
    if summary.is_clean() {
        info!(
            applied = summary.applied_rates,
            funded = summary.funded_tokens.len(),
            "✅ Plan completed"
        );
    } else {
        warn!(
            failed_batches = summary.failed_batches.len(),
            failed_funding = summary.failed_funding.len(),
            "Plan completed with failures; resubmit the listed entries manually"
        );
    }

    Ok(DeploymentReport { plan: plan.name.clone(), context, router, summary })
}

/// Verification-only; read failures are logged and ignored.
async fn log_balances<L: RemoteLedger>(
    ledger: &L,
    book: &AddressBook,
    funding: &[FundingRequest],
    owner: Address,
    stage: &str,
) {
    if funding.is_empty() {
        return;
    }
    info!("{} router balances:", stage);
    for request in funding {
        let name = request.display_name();
        let decimals = request
            .label
            .as_deref()
            .and_then(|symbol| book.get(symbol))
            .map(|entry| entry.decimals)
            .unwrap_or(18);
        match ledger.balance_of(request.token, owner).await {
            Ok(balance) => {
                let shown = format_units(balance, decimals).unwrap_or_else(|_| balance.to_string());
                info!("   {}: {}", name, shown);
            }
            Err(e) => warn!(token = ?request.token, error = %e, "Could not read {} balance", name),
        }
    }
}
