use crate::blockchain::{ChainAccount, CosmosClient};
use crate::config::ToolsConfig;
use crate::retry::{execute_with_retry, RetryConfig};
use anyhow::{Context, Result};
use chrono::DateTime;
use cosmos_sdk_proto::cosmos::bank::v1beta1::QuerySpendableBalancesResponse;
use cosmos_sdk_proto::cosmos::base::query::v1beta1::PageRequest;
use cosmos_sdk_proto::cosmos::base::v1beta1::Coin;
use cosmos_sdk_proto::cosmos::vesting::v1beta1::BaseVestingAccount;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoinView {
    pub denom: String,
    pub amount: String,
}

impl From<&Coin> for CoinView {
    fn from(coin: &Coin) -> Self {
        Self {
            denom: coin.denom.clone(),
            amount: coin.amount.clone(),
        }
    }
}

fn coins(list: &[Coin]) -> Vec<CoinView> {
    list.iter().map(CoinView::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginationView {
    /// Hex encoded, pass back as `--page-key`.
    pub next_key: Option<String>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendableBalancesView {
    pub address: String,
    pub balances: Vec<CoinView>,
    pub pagination: Option<PaginationView>,
}

impl SpendableBalancesView {
    pub fn new(address: &str, resp: &QuerySpendableBalancesResponse) -> Self {
        Self {
            address: address.to_string(),
            balances: coins(&resp.balances),
            pagination: resp.pagination.as_ref().map(|p| PaginationView {
                next_key: (!p.next_key.is_empty()).then(|| hex::encode(&p.next_key)),
                total: p.total,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodView {
    pub length_seconds: i64,
    pub amount: Vec<CoinView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VestingView {
    pub original_vesting: Vec<CoinView>,
    pub delegated_free: Vec<CoinView>,
    pub delegated_vesting: Vec<CoinView>,
    pub start_time: Option<String>,
    pub end_time: String,
    pub periods: Vec<PeriodView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountView {
    pub address: String,
    pub account_type: String,
    pub account_number: u64,
    pub sequence: u64,
    /// `None` for accounts without a vesting schedule.
    pub vesting: Option<VestingView>,
}

fn timestamp(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}

fn vesting_view(base: Option<&BaseVestingAccount>, start_time: Option<i64>, periods: Vec<PeriodView>) -> VestingView {
    let empty = BaseVestingAccount::default();
    let base = base.unwrap_or(&empty);
    VestingView {
        original_vesting: coins(&base.original_vesting),
        delegated_free: coins(&base.delegated_free),
        delegated_vesting: coins(&base.delegated_vesting),
        start_time: start_time.map(timestamp),
        end_time: timestamp(base.end_time),
        periods,
    }
}

impl AccountView {
    pub fn new(account: &ChainAccount) -> Self {
        let (address, account_number, sequence) = account
            .base_account()
            .map(|b| (b.address.clone(), b.account_number, b.sequence))
            .unwrap_or_default();

        let vesting = match account {
            ChainAccount::Base(_) => None,
            ChainAccount::ContinuousVesting(acc) => Some(vesting_view(
                acc.base_vesting_account.as_ref(),
                Some(acc.start_time),
                vec![],
            )),
            ChainAccount::DelayedVesting(acc) => {
                Some(vesting_view(acc.base_vesting_account.as_ref(), None, vec![]))
            }
            ChainAccount::PeriodicVesting(acc) => Some(vesting_view(
                acc.base_vesting_account.as_ref(),
                Some(acc.start_time),
                acc.vesting_periods
                    .iter()
                    .map(|p| PeriodView {
                        length_seconds: p.length,
                        amount: coins(&p.amount),
                    })
                    .collect(),
            )),
            ChainAccount::PermanentLocked(acc) => {
                Some(vesting_view(acc.base_vesting_account.as_ref(), None, vec![]))
            }
        };

        Self {
            address,
            account_type: account.type_url().trim_start_matches('/').to_string(),
            account_number,
            sequence,
            vesting,
        }
    }
}

/// Pagination flags of `query spendable-balances`.
#[derive(Debug, Clone, Default)]
pub struct PageArgs {
    pub page_key: Option<String>,
    pub offset: u64,
    pub limit: u64,
    pub count_total: bool,
}

impl PageArgs {
    pub fn to_page_request(&self) -> Result<Option<PageRequest>> {
        if self.page_key.is_none() && self.offset == 0 && self.limit == 0 && !self.count_total {
            return Ok(None);
        }
        let key = match &self.page_key {
            Some(k) => hex::decode(k).with_context(|| format!("invalid page key {k:?}"))?,
            None => vec![],
        };
        if !key.is_empty() && self.offset > 0 {
            return Err(anyhow::anyhow!("page key and offset are mutually exclusive"));
        }
        Ok(Some(PageRequest {
            key,
            offset: self.offset,
            limit: self.limit,
            count_total: self.count_total,
            reverse: false,
        }))
    }
}

/// Read-only bank and auth queries printed as JSON on stdout.
pub struct QueryJob {
    config: ToolsConfig,
}

impl QueryJob {
    pub fn new(config: ToolsConfig) -> Self {
        Self { config }
    }

    async fn connect(&self) -> Result<CosmosClient> {
        let retry_config = RetryConfig::from(&self.config.retry);
        execute_with_retry(
            || {
                let grpc_url = self.config.chain.grpc_url.clone();
                async move { CosmosClient::connect(&grpc_url).await }
            },
            &retry_config,
            "gRPC connection",
        )
        .await
    }

    pub async fn spendable_balances(&self, address: &str, page: &PageArgs) -> Result<()> {
        let addr = CosmosClient::parse_address(address, &self.config.chain.account_prefix)?;
        let pagination = page.to_page_request()?;
        let client = self.connect().await?;

        let resp = client.spendable_balances(&addr, pagination).await?;
        let view = SpendableBalancesView::new(&addr.to_string(), &resp);
        println!("{}", serde_json::to_string_pretty(&view)?);
        Ok(())
    }

    pub async fn vesting_account(&self, address: &str) -> Result<()> {
        let addr = CosmosClient::parse_address(address, &self.config.chain.account_prefix)?;
        let client = self.connect().await?;

        let account = client.account(&addr).await?;
        let view = AccountView::new(&account);
        println!("{}", serde_json::to_string_pretty(&view)?);
        Ok(())
    }
}
