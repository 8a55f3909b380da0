// tests/anvil_test.rs

// Needs a running Anvil/Hardhat node, compiled MockERC20Token and
// MockUniswapV3Router artifacts, and RPC_URL/PRIVATE_KEY/ARTIFACTS_DIR in .env.
// Run with: cargo test --test anvil_test -- --ignored

use ethers::prelude::*;
use eyre::{Result, WrapErr};
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

use mockswap_deployer::bindings::MockERC20Token;
use mockswap_deployer::chain::{connect, EthersLedger};
use mockswap_deployer::config::load_chain_config;
use mockswap_deployer::deploy::EthersDeployer;
use mockswap_deployer::{run_plan, DeploymentPlan, RunContext, WorkflowSettings};

fn setup_tracing() {
    let _ = fmt()
        .with_max_level(LevelFilter::INFO)
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[tokio::test]
#[ignore]
async fn core_plan_on_local_node() -> Result<()> {
    setup_tracing();
    let config = load_chain_config()?;
    let client = connect(&config).await.wrap_err("Is the local node running?")?;
    let deployer = client.address();
    let chain_id = client.signer().chain_id();

    let factory = EthersDeployer::new(
        client.clone(),
        config.artifacts_dir.clone(),
        config.confirm_settings(),
    );
    let confirm = config.confirm_settings();
    let ledger_client = client.clone();
    let report = run_plan(
        &DeploymentPlan::core(),
        &factory,
        move |router| EthersLedger::new(ledger_client, router, confirm),
        WorkflowSettings {
            batch_size: config.rate_batch_size,
            gas_limit: config.rate_batch_gas_limit,
        },
        RunContext { chain_id, deployer },
    )
    .await?;
    info!("\n{}", report);

    assert!(report.summary.is_clean(), "unexpected failures:\n{}", report.summary);
    assert_eq!(report.summary.applied_rates, 12);

    let weth = MockERC20Token::new(report.summary.deployed["WETH"], client.clone());
    assert_eq!(weth.decimals().call().await?, 18);
    assert_eq!(weth.balance_of(report.router).call().await?, U256::from(50u64) * U256::exp10(18));
    assert_eq!(weth.symbol().call().await?, "WETH");
    Ok(())
}
