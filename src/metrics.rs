use crate::blockchain::CosmosClient;
use crate::coin::STAKE_DENOM;
use anyhow::Result;
use async_trait::async_trait;
use cosmrs::AccountId;
use prometheus::core::Collector;
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, Gauge, GaugeVec, Opts, TextEncoder};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::error;

pub const APP_NAME: &str = "tgrade_tools";

/// Per-account balances in utgd as reported by the bank module.
#[async_trait]
pub trait BalanceQuerier: Send + Sync {
    async fn liquid_balance(&self, address: &AccountId) -> Result<u128>;
    async fn total_balance(&self, address: &AccountId) -> Result<u128>;
}

#[async_trait]
impl BalanceQuerier for CosmosClient {
    async fn liquid_balance(&self, address: &AccountId) -> Result<u128> {
        self.spendable_balance(address, STAKE_DENOM).await
    }

    async fn total_balance(&self, address: &AccountId) -> Result<u128> {
        self.balance(address, STAKE_DENOM).await
    }
}

/// Collects `liquid_balance` and `total_balance` gauges for the watched accounts.
///
/// Every scrape queries the node afresh. A failing account is logged and left
/// out of the scrape; the remaining accounts are still reported.
pub struct BalanceCollector {
    querier: Arc<dyn BalanceQuerier>,
    addresses: Vec<AccountId>,
    collect_timeout: Duration,
}

impl BalanceCollector {
    pub fn new(querier: Arc<dyn BalanceQuerier>, addresses: Vec<AccountId>, collect_timeout: Duration) -> Self {
        Self {
            querier,
            addresses,
            collect_timeout,
        }
    }

    pub fn addresses(&self) -> &[AccountId] {
        &self.addresses
    }

    pub async fn collect(&self) -> Result<Vec<MetricFamily>> {
        let total = GaugeVec::new(
            Opts::new("total_balance", "The current total token amount in TGD"),
            &["account"],
        )?;
        let liquid = GaugeVec::new(
            Opts::new("liquid_balance", "The current liquid token amount in TGD"),
            &["account"],
        )?;

        let deadline = Instant::now() + self.collect_timeout;
        for addr in &self.addresses {
            let account = addr.to_string();

            match timeout_at(deadline, self.querier.liquid_balance(addr)).await {
                Ok(Ok(amount)) => liquid.with_label_values(&[account.as_str()]).set(amount as f64),
                Ok(Err(e)) => {
                    error!(address = %account, cause = %e, "failed to query spendable balance");
                    continue;
                }
                Err(_) => {
                    error!(address = %account, "spendable balance query timed out");
                    continue;
                }
            }

            match timeout_at(deadline, self.querier.total_balance(addr)).await {
                Ok(Ok(amount)) => total.with_label_values(&[account.as_str()]).set(amount as f64),
                Ok(Err(e)) => {
                    error!(address = %account, cause = %e, "failed to query total tgd balance");
                }
                Err(_) => {
                    error!(address = %account, "total balance query timed out");
                }
            }
        }

        let mut families = build_info()?.collect();
        families.extend(liquid.collect());
        families.extend(total.collect());
        // the text encoder rejects families without samples
        families.retain(|mf| !mf.get_metric().is_empty());
        Ok(families)
    }

    /// Text exposition of one scrape.
    pub async fn render(&self) -> Result<String> {
        let families = self.collect().await?;
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

fn build_info() -> Result<Gauge> {
    let gauge = Gauge::with_opts(
        Opts::new(
            format!("{APP_NAME}_build_info"),
            format!("A metric with a constant '1' value labeled by version from which {APP_NAME} was built."),
        )
        .const_label("version", env!("CARGO_PKG_VERSION")),
    )?;
    gauge.set(1.0);
    Ok(gauge)
}
