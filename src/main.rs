use anyhow::Result;
use clap::{Parser, Subcommand};
use tgrade_tools::jobs::query::PageArgs;
use tgrade_tools::{CompoundJob, ExporterJob, QueryJob, ToolsConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Helpful tgrade CLI tools and queries
#[derive(Parser, Debug)]
#[command(name = "tgrade-tools", version, about = "Helpful tgrade CLI tools and queries")]
struct Cli {
    /// Path to the TOML configuration file. Built-in mainnet defaults when omitted.
    #[arg(long, global = true)]
    config: Option<String>,

    /// gRPC endpoint of the node, overrides [chain] grpc_url
    #[arg(long, global = true)]
    grpc_url: Option<String>,

    /// The network chain ID, overrides [chain] chain_id
    #[arg(long, global = true)]
    chain_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Query, claim and stake all rewards. Watch your balance to not run out of tokens to pay fees
    Compound {
        /// The minimum amount to claim and delegate
        #[arg(long = "min-amount")]
        min_amount: Option<String>,

        /// The reward amount that should not be delegated
        #[arg(long = "reserve-amount")]
        reserve_amount: Option<String>,

        /// Build and print the transaction without broadcasting it
        #[arg(long)]
        dry_run: bool,
    },

    /// Start a prometheus exporter to collect liquid and total account balances
    Exporter {
        /// Comma separated addresses to watch
        addresses: String,

        /// Prometheus http listen address, overrides [exporter] listen_address
        #[arg(long = "prometheus-listen-address")]
        prometheus_listen_address: Option<String>,
    },

    /// Querying commands
    #[command(subcommand)]
    #[command(alias = "q")]
    Query(QueryCommands),
}

#[derive(Subcommand, Debug)]
enum QueryCommands {
    /// Query the liquid account balances by address
    SpendableBalances {
        address: String,

        /// Hex encoded pagination key of the next page
        #[arg(long)]
        page_key: Option<String>,

        #[arg(long, default_value_t = 0)]
        offset: u64,

        #[arg(long, default_value_t = 0)]
        limit: u64,

        /// Count the total number of balances
        #[arg(long)]
        count_total: bool,
    },

    /// Query the vesting account details by address
    VestingAccount { address: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ToolsConfig::load_or_default(cli.config.as_deref())?;
    if let Some(grpc_url) = cli.grpc_url {
        config.chain.grpc_url = grpc_url;
    }
    if let Some(chain_id) = cli.chain_id {
        config.chain.chain_id = chain_id;
    }
    info!(chain_id = %config.chain.chain_id, grpc_url = %config.chain.grpc_url, "configuration loaded");

    match cli.command {
        Commands::Compound {
            min_amount,
            reserve_amount,
            dry_run,
        } => {
            let min_amount = min_amount.unwrap_or_else(|| config.thresholds.min_amount.clone());
            let reserve_amount = reserve_amount.unwrap_or_else(|| config.thresholds.reserve_amount.clone());
            CompoundJob::new(config, min_amount, reserve_amount, dry_run)
                .execute()
                .await?
        }
        Commands::Exporter {
            addresses,
            prometheus_listen_address,
        } => {
            ExporterJob::new(config, addresses, prometheus_listen_address)
                .execute()
                .await?
        }
        Commands::Query(query) => {
            let job = QueryJob::new(config);
            match query {
                QueryCommands::SpendableBalances {
                    address,
                    page_key,
                    offset,
                    limit,
                    count_total,
                } => {
                    let page = PageArgs {
                        page_key,
                        offset,
                        limit,
                        count_total,
                    };
                    job.spendable_balances(&address, &page).await?
                }
                QueryCommands::VestingAccount { address } => job.vesting_account(&address).await?,
            }
        }
    }

    Ok(())
}
