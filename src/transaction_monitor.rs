use crate::blockchain::CosmosClient;
use anyhow::Result;
use async_trait::async_trait;
use cosmos_sdk_proto::cosmos::base::abci::v1beta1::TxResponse;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone)]
pub struct TransactionReceipt {
    pub hash: String,
    pub height: i64,
    pub gas_used: i64,
    pub code: u32,
    pub raw_log: String,
    pub status: TransactionStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransactionStatus {
    Success,
    Failed,
    Timeout,
}

/// Source of indexed transactions, `Ok(None)` while still pending.
#[async_trait]
pub trait TxLookup: Send + Sync {
    async fn lookup_tx(&self, hash: &str) -> Result<Option<TxResponse>>;
}

#[async_trait]
impl TxLookup for CosmosClient {
    async fn lookup_tx(&self, hash: &str) -> Result<Option<TxResponse>> {
        self.get_tx(hash).await
    }
}

pub struct TransactionMonitor {
    lookup: Arc<dyn TxLookup>,
    max_wait_time: Duration,
    poll_interval: Duration,
}

impl TransactionMonitor {
    pub fn new(lookup: impl TxLookup + 'static, max_wait_time: Duration, poll_interval: Duration) -> Self {
        Self {
            lookup: Arc::new(lookup),
            max_wait_time,
            poll_interval,
        }
    }

    pub async fn monitor_transaction(&self, tx_hash: &str) -> Result<TransactionReceipt> {
        println!("🔍 Monitoring transaction: {}", tx_hash);

        let start_time = std::time::Instant::now();

        loop {
            if start_time.elapsed() > self.max_wait_time {
                println!("⏰ Transaction monitoring timeout after {:?}", self.max_wait_time);
                return Ok(TransactionReceipt {
                    hash: tx_hash.to_string(),
                    height: 0,
                    gas_used: 0,
                    code: 0,
                    raw_log: String::new(),
                    status: TransactionStatus::Timeout,
                });
            }

            match self.lookup.lookup_tx(tx_hash).await {
                Ok(Some(resp)) => {
                    let status = if resp.code == 0 {
                        TransactionStatus::Success
                    } else {
                        TransactionStatus::Failed
                    };

                    println!("✅ Transaction included: {} (Status: {:?})", tx_hash, status);

                    return Ok(TransactionReceipt {
                        hash: tx_hash.to_string(),
                        height: resp.height,
                        gas_used: resp.gas_used,
                        code: resp.code,
                        raw_log: resp.raw_log,
                        status,
                    });
                }
                Ok(None) => {
                    println!("⏳ Transaction pending, waiting...");
                }
                Err(e) => {
                    println!("❌ Error checking transaction status: {}", e);
                }
            }

            sleep(self.poll_interval).await;
        }
    }
}
