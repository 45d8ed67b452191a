use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use toml::map::Map;

/// Tgrade mainnet distribution contract (`tgrade q poe contract-address DISTRIBUTION`).
pub const MAINNET_DISTRIBUTION_ADDR: &str =
    "tgrade1wl59k23zngj34l7d42y9yltask7rjlnxgccawc7ltrknp6n52fps2p2ent";
/// Tgrade mainnet engagement contract (`tgrade q poe contract-address ENGAGEMENT`).
pub const MAINNET_ENGAGEMENT_ADDR: &str =
    "tgrade14hj2tavq8fpesdwxxcu44rty3hh90vhujrvcmstl4zr3txmfvw9s07fvfr";

const COMMON_CONFIG_PATH: &str = "configs/common.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub chain: ChainSettings,
    pub contracts: ContractAddresses,
    pub thresholds: Thresholds,
    pub signer: Option<SignerSettings>,
    pub transaction: TransactionSettings,
    pub monitoring: MonitoringSettings,
    pub retry: RetrySettings,
    pub exporter: ExporterSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainSettings {
    pub chain_id: String,
    pub grpc_url: String,
    pub account_prefix: String,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            chain_id: "tgrade-mainnet-1".to_string(),
            grpc_url: "http://localhost:9090".to_string(),
            account_prefix: "tgrade".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractAddresses {
    pub distribution_address: String,
    pub engagement_address: String,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self {
            distribution_address: MAINNET_DISTRIBUTION_ADDR.to_string(),
            engagement_address: MAINNET_ENGAGEMENT_ADDR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Thresholds {
    pub min_amount: String,
    pub reserve_amount: String,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_amount: "2tgd".to_string(),
            reserve_amount: "20000utgd".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignerSettings {
    /// Hex encoded secp256k1 secret key, usually `${TGRADE_SIGNER_KEY}`.
    pub private_key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransactionSettings {
    pub gas_limit: u64,
    /// Price per gas unit in utgd.
    pub gas_price: f64,
    pub memo: String,
}

impl Default for TransactionSettings {
    fn default() -> Self {
        Self {
            gas_limit: 400_000,
            gas_price: 0.05,
            memo: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitoringSettings {
    pub transaction_timeout_seconds: u64,
    pub poll_interval_seconds: u64,
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            transaction_timeout_seconds: 60,
            poll_interval_seconds: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_seconds: u64,
    pub max_delay_seconds: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_seconds: 2,
            max_delay_seconds: 30,
            backoff_multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExporterSettings {
    pub listen_address: String,
    pub collect_timeout_millis: u64,
}

impl Default for ExporterSettings {
    fn default() -> Self {
        Self {
            listen_address: ":8081".to_string(),
            collect_timeout_millis: 2_000,
        }
    }
}

impl ToolsConfig {
    pub fn load(path: &str) -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let common_content = Self::load_common_config()?;
        let specific_content =
            fs::read_to_string(path).with_context(|| format!("read config file {path}"))?;

        let merged_content = Self::merge_configs(common_content, specific_content)?;
        let content = Self::substitute_env_vars(merged_content)?;

        let config: ToolsConfig =
            toml::from_str(&content).with_context(|| format!("parse config file {path}"))?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise the built-in mainnet defaults.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                dotenv::dotenv().ok();
                Ok(Self::default())
            }
        }
    }

    fn load_common_config() -> Result<String> {
        match fs::read_to_string(COMMON_CONFIG_PATH) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::new()),
        }
    }

    fn merge_configs(common: String, specific: String) -> Result<String> {
        if common.is_empty() {
            return Ok(specific);
        }

        let common_toml: toml::Value = toml::from_str(&common)?;
        let specific_toml: toml::Value = toml::from_str(&specific)?;

        // specific overrides common
        let merged = Self::merge_toml_values(common_toml, specific_toml);
        Ok(toml::to_string_pretty(&merged)?)
    }

    fn merge_toml_values(mut base: toml::Value, override_val: toml::Value) -> toml::Value {
        match (&mut base, override_val) {
            (toml::Value::Table(base_map), toml::Value::Table(override_map)) => {
                for (key, value) in override_map {
                    let merged = Self::merge_toml_values(
                        base_map
                            .get(&key)
                            .cloned()
                            .unwrap_or(toml::Value::Table(Map::new())),
                        value,
                    );
                    base_map.insert(key, merged);
                }
                base
            }
            (_, override_val) => override_val,
        }
    }

    fn substitute_env_vars(content: String) -> Result<String> {
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")?;
        let mut result = content.clone();

        for cap in re.captures_iter(&content) {
            let var_name = &cap[1];
            if let Ok(value) = env::var(var_name) {
                result = result.replace(&cap[0], &value);
            }
        }

        Ok(result)
    }

    /// Signing key, required only by commands that broadcast.
    pub fn signer_key(&self) -> Result<&str> {
        let signer = self.signer.as_ref().ok_or_else(|| {
            anyhow::anyhow!("signer configuration is required. Set [signer] private_key in your config file.")
        })?;
        let key = signer.private_key.trim();
        if key.is_empty() || key.starts_with("${") {
            return Err(anyhow::anyhow!(
                "signer private_key is empty or references an unset environment variable"
            ));
        }
        Ok(key)
    }

    /// Fee for one compound transaction in utgd, rounded up.
    pub fn fee_amount(&self) -> u128 {
        let fee = (self.transaction.gas_limit as f64 * self.transaction.gas_price).ceil();
        if fee <= 0.0 {
            0
        } else {
            fee as u128
        }
    }
}
