// deployer/src/main.rs

// --- Imports ---
use clap::{Parser, Subcommand};
use ethers::prelude::*;
use eyre::{Result, WrapErr};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mockswap_deployer::chain::{connect, EthersLedger};
use mockswap_deployer::config::{load_chain_config, OracleConfig, ServerConfig};
use mockswap_deployer::deploy::EthersDeployer;
use mockswap_deployer::oracle::{feed_id_for_pair, HermesClient};
use mockswap_deployer::plan::DeploymentPlan;
use mockswap_deployer::server;
use mockswap_deployer::utils::format_units;
use mockswap_deployer::workflow::{run_plan, RunContext, WorkflowSettings};

// --- CLI Argument Parsing ---
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Mock swap deployment, liquidity and query tooling",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a deployment plan: deploy tokens and router, set rates, fund the router.
    Deploy {
        /// Built-in plan (`core`, `extra-stables`, `fund-router`) or a JSON plan file.
        #[arg(long, value_name = "PLAN", default_value = "core")]
        plan: String,

        /// Also print the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Shorthand for `deploy --plan fund-router`.
    FundRouter {
        #[arg(long)]
        json: bool,
    },

    /// Serve `GET /swapInfo`.
    Serve {
        /// Overrides PORT.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the latest prices (USDT/USD and USDC/USD when no feed is named).
    Prices {
        #[arg(long = "id", value_name = "FEED_ID")]
        ids: Vec<String>,

        /// Known pair symbol, e.g. `USDC/USD`.
        #[arg(long = "pair", value_name = "PAIR")]
        pairs: Vec<String>,
    },
}

// --- Main Execution ---
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Deploy { plan, json } => deploy(&plan, json).await,
        Command::FundRouter { json } => deploy("fund-router", json).await,
        Command::Serve { port } => {
            let mut config = ServerConfig::from_env();
            if let Some(port) = port {
                config.port = port;
            }
            server::serve(config).await
        }
        Command::Prices { ids, pairs } => prices(ids, pairs).await,
    }
}

async fn deploy(plan_name: &str, json: bool) -> Result<()> {
    let config = load_chain_config()?;
    let plan = DeploymentPlan::load(plan_name, &config.existing)?;

    let client = connect(&config).await?;
    let deployer = client.address();
    let chain_id = client.signer().chain_id();
    let balance = client
        .get_balance(deployer, None)
        .await
        .wrap_err("Failed to read deployer balance")?;
    info!("Deploying with account: {:?}", deployer);
    info!("Account balance: {} ETH", format_units(balance, 18)?);

    let factory = EthersDeployer::new(
        client.clone(),
        config.artifacts_dir.clone(),
        config.confirm_settings(),
    );
    let confirm = config.confirm_settings();
    let ledger_client = client.clone();
    let settings = WorkflowSettings {
        batch_size: config.rate_batch_size,
        gas_limit: config.rate_batch_gas_limit,
    };

    let report = run_plan(
        &plan,
        &factory,
        move |router| EthersLedger::new(ledger_client, router, confirm),
        settings,
        RunContext { chain_id, deployer },
    )
    .await?;

    println!("{}", report);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

async fn prices(mut ids: Vec<String>, pairs: Vec<String>) -> Result<()> {
    for pair in &pairs {
        ids.push(feed_id_for_pair(pair)?);
    }
    let client = HermesClient::new(&OracleConfig::from_env()?)?;
    let prices = if ids.is_empty() {
        client.fetch_stablecoin_prices().await?
    } else {
        client.fetch_prices(&ids).await?
    };

    for quote in &prices.quotes {
        let published = quote
            .published_at()
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| quote.timestamp.to_string());
        println!(
            "{}  price={} expo={} conf={} published={}  (~{:.6})",
            quote.id,
            quote.price,
            quote.exponent,
            quote.confidence,
            published,
            quote.scaled_price()
        );
    }
    for id in &prices.missing {
        println!("{}  no data", id);
    }
    Ok(())
}
