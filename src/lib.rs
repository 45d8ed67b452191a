pub mod api;
pub mod blockchain;
pub mod coin;
pub mod config;
pub mod contracts;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod retry;
pub mod signer;
pub mod transaction_monitor;

pub use blockchain::{CosmosClient, SigningClient};
pub use coin::TokenAmount;
pub use config::ToolsConfig;
pub use error::CompoundError;
pub use jobs::compound::{Compounder, CompoundOutcome, CompoundSettings, RewardQuerier, TransactionSubmitter};
pub use jobs::{CompoundJob, ExporterJob, QueryJob};
pub use retry::{execute_with_retry, RetryConfig};
pub use transaction_monitor::{TransactionMonitor, TransactionReceipt, TransactionStatus};
