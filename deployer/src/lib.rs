// deployer/src/lib.rs
// Library interface shared by the `mockswap` binary and the integration tests

pub mod bindings;
pub mod chain;
pub mod config;
pub mod deploy;
pub mod driver;
pub mod errors;
pub mod ledger;
pub mod oracle;
pub mod plan;
pub mod server;
pub mod transaction;
pub mod types;
pub mod utils;
pub mod workflow;

// Public types re-exported for convenience
pub use driver::{build_summary, partition_into_batches, BatchDriver};
pub use errors::{DriverError, LedgerError, PlanError, PriceFeedError};
pub use ledger::{ConstructorArgs, ContractFactory, ContractKind, RemoteLedger};
pub use plan::DeploymentPlan;
pub use types::{
    Batch, Confirmation, DeploymentSummary, FundingRequest, FundingResult, RateUpdate,
    SubmissionResult, SubmissionStatus,
};
pub use workflow::{run_plan, DeploymentReport, RunContext, WorkflowSettings};
