use crate::api::{parse_listen_address, Server};
use crate::blockchain::CosmosClient;
use crate::config::ToolsConfig;
use crate::metrics::BalanceCollector;
use crate::retry::{execute_with_retry, RetryConfig};
use anyhow::{Context, Result};
use cosmrs::AccountId;
use std::sync::Arc;
use std::time::Duration;

/// Serves liquid and total balances of the watched accounts to Prometheus.
pub struct ExporterJob {
    config: ToolsConfig,
    addresses: String,
    listen_address: Option<String>,
}

impl ExporterJob {
    pub fn new(config: ToolsConfig, addresses: String, listen_address: Option<String>) -> Self {
        Self {
            config,
            addresses,
            listen_address,
        }
    }

    /// Splits and validates the comma separated address list.
    pub fn parse_addresses(addresses: &str, prefix: &str) -> Result<Vec<AccountId>> {
        let parsed = addresses
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(|a| CosmosClient::parse_address(a, prefix).with_context(|| format!("address: {a}")))
            .collect::<Result<Vec<_>>>()?;
        if parsed.is_empty() {
            return Err(anyhow::anyhow!("no addresses to watch"));
        }
        Ok(parsed)
    }

    pub async fn execute(&self) -> Result<()> {
        println!("🔍 Balance Exporter Starting...");

        let addresses = Self::parse_addresses(&self.addresses, &self.config.chain.account_prefix)?;
        let listen = self
            .listen_address
            .as_deref()
            .unwrap_or(&self.config.exporter.listen_address);
        let listen_address = parse_listen_address(listen)?;

        let retry_config = RetryConfig::from(&self.config.retry);
        let client = execute_with_retry(
            || {
                let grpc_url = self.config.chain.grpc_url.clone();
                async move { CosmosClient::connect(&grpc_url).await }
            },
            &retry_config,
            "gRPC connection",
        )
        .await?;

        for addr in &addresses {
            println!("👀 Watching {}", addr);
        }

        let collector = BalanceCollector::new(
            Arc::new(client),
            addresses,
            Duration::from_millis(self.config.exporter.collect_timeout_millis),
        );
        Server::new(Arc::new(collector), listen_address).start().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "tgrade1wl59k23zngj34l7d42y9yltask7rjlnxgccawc7ltrknp6n52fps2p2ent";
    const B: &str = "tgrade14hj2tavq8fpesdwxxcu44rty3hh90vhujrvcmstl4zr3txmfvw9s07fvfr";

    #[test]
    fn test_parse_addresses() {
        let parsed = ExporterJob::parse_addresses(&format!("{A}, {B}"), "tgrade").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].to_string(), B);
    }

    #[test]
    fn test_parse_addresses_rejects_invalid_entry() {
        let err = ExporterJob::parse_addresses(&format!("{A},bogus"), "tgrade").unwrap_err();
        assert!(err.to_string().contains("bogus"));
        assert!(ExporterJob::parse_addresses(" , ", "tgrade").is_err());
    }
}
