use crate::coin::{amount_of, TokenAmount, STAKE_DENOM};
use crate::config::ToolsConfig;
use crate::contracts::RewardPoolContract;
use crate::error::CompoundError;
use crate::jobs::compound::{CompoundMsg, RewardQuerier, TransactionSubmitter, TxOutcome};
use crate::signer::KeySigner;
use crate::transaction_monitor::{TransactionMonitor, TransactionStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use cosmos_sdk_proto::cosmos::auth::v1beta1::{
    query_client::QueryClient as AuthQueryClient, BaseAccount, QueryAccountRequest,
};
use cosmos_sdk_proto::cosmos::bank::v1beta1::{
    query_client::QueryClient as BankQueryClient, QueryBalanceRequest, QuerySpendableBalancesRequest,
    QuerySpendableBalancesResponse,
};
use cosmos_sdk_proto::cosmos::base::abci::v1beta1::TxResponse;
use cosmos_sdk_proto::cosmos::base::query::v1beta1::PageRequest;
use cosmos_sdk_proto::cosmos::tx::v1beta1::{
    service_client::ServiceClient as TxServiceClient, BroadcastMode, BroadcastTxRequest, GetTxRequest,
};
use cosmos_sdk_proto::cosmos::vesting::v1beta1::{
    ContinuousVestingAccount, DelayedVestingAccount, PeriodicVestingAccount, PermanentLockedAccount,
};
use cosmos_sdk_proto::cosmwasm::wasm::v1::{
    query_client::QueryClient as WasmQueryClient, QuerySmartContractStateRequest,
};
use cosmos_sdk_proto::Any;
use cosmrs::tendermint::chain;
use cosmrs::tx::{Body, Fee, SignDoc, SignerInfo};
use cosmrs::AccountId;
use prost::Message;
use std::str::FromStr;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info};
use url::Url;

pub const BASE_ACCOUNT_TYPE_URL: &str = "/cosmos.auth.v1beta1.BaseAccount";
pub const CONTINUOUS_VESTING_TYPE_URL: &str = "/cosmos.vesting.v1beta1.ContinuousVestingAccount";
pub const DELAYED_VESTING_TYPE_URL: &str = "/cosmos.vesting.v1beta1.DelayedVestingAccount";
pub const PERIODIC_VESTING_TYPE_URL: &str = "/cosmos.vesting.v1beta1.PeriodicVestingAccount";
pub const PERMANENT_LOCKED_TYPE_URL: &str = "/cosmos.vesting.v1beta1.PermanentLockedAccount";

/// Decoded `auth` account, base or one of the SDK vesting types.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainAccount {
    Base(BaseAccount),
    ContinuousVesting(ContinuousVestingAccount),
    DelayedVesting(DelayedVestingAccount),
    PeriodicVesting(PeriodicVestingAccount),
    PermanentLocked(PermanentLockedAccount),
}

impl ChainAccount {
    pub fn decode(any: &Any) -> Result<Self> {
        let bytes = any.value.as_slice();
        let account = match any.type_url.as_str() {
            BASE_ACCOUNT_TYPE_URL => ChainAccount::Base(BaseAccount::decode(bytes)?),
            CONTINUOUS_VESTING_TYPE_URL => ChainAccount::ContinuousVesting(ContinuousVestingAccount::decode(bytes)?),
            DELAYED_VESTING_TYPE_URL => ChainAccount::DelayedVesting(DelayedVestingAccount::decode(bytes)?),
            PERIODIC_VESTING_TYPE_URL => ChainAccount::PeriodicVesting(PeriodicVestingAccount::decode(bytes)?),
            PERMANENT_LOCKED_TYPE_URL => ChainAccount::PermanentLocked(PermanentLockedAccount::decode(bytes)?),
            other => return Err(anyhow::anyhow!("unsupported account type {}", other)),
        };
        Ok(account)
    }

    pub fn type_url(&self) -> &'static str {
        match self {
            ChainAccount::Base(_) => BASE_ACCOUNT_TYPE_URL,
            ChainAccount::ContinuousVesting(_) => CONTINUOUS_VESTING_TYPE_URL,
            ChainAccount::DelayedVesting(_) => DELAYED_VESTING_TYPE_URL,
            ChainAccount::PeriodicVesting(_) => PERIODIC_VESTING_TYPE_URL,
            ChainAccount::PermanentLocked(_) => PERMANENT_LOCKED_TYPE_URL,
        }
    }

    pub fn base_account(&self) -> Option<&BaseAccount> {
        let base_vesting = match self {
            ChainAccount::Base(base) => return Some(base),
            ChainAccount::ContinuousVesting(acc) => acc.base_vesting_account.as_ref(),
            ChainAccount::DelayedVesting(acc) => acc.base_vesting_account.as_ref(),
            ChainAccount::PeriodicVesting(acc) => acc.base_vesting_account.as_ref(),
            ChainAccount::PermanentLocked(acc) => acc.base_vesting_account.as_ref(),
        };
        base_vesting.and_then(|v| v.base_account.as_ref())
    }
}

/// gRPC client for a Tgrade node.
#[derive(Clone)]
pub struct CosmosClient {
    channel: Channel,
}

impl CosmosClient {
    pub async fn connect(grpc_url: &str) -> Result<Self> {
        println!("🔗 Connecting to gRPC: {}", grpc_url);

        let url = Url::parse(grpc_url).with_context(|| format!("invalid gRPC url {grpc_url}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow::anyhow!("gRPC url must use http or https: {}", grpc_url));
        }
        let channel = Endpoint::from_shared(grpc_url.to_string())?.connect().await?;

        println!("✅ Connected to {}", grpc_url);
        Ok(Self { channel })
    }

    /// Client over an already built channel, e.g. `Endpoint::connect_lazy`.
    pub fn from_channel(channel: Channel) -> Self {
        Self { channel }
    }

    /// Bech32 account address with the expected prefix.
    pub fn parse_address(addr: &str, prefix: &str) -> Result<AccountId, CompoundError> {
        let invalid = |reason: String| CompoundError::InvalidAddress {
            address: addr.to_string(),
            reason,
        };
        let account = AccountId::from_str(addr.trim()).map_err(|e| invalid(e.to_string()))?;
        if account.prefix() != prefix {
            return Err(invalid(format!("expected prefix {prefix:?}, got {:?}", account.prefix())));
        }
        Ok(account)
    }

    /// Raw smart query, returns the contract's JSON response.
    pub async fn smart_query(&self, contract: &AccountId, query: Vec<u8>) -> Result<Vec<u8>> {
        let mut client = WasmQueryClient::new(self.channel.clone());
        let resp = client
            .smart_contract_state(QuerySmartContractStateRequest {
                address: contract.to_string(),
                query_data: query.clone(),
            })
            .await
            .with_context(|| format!("smart query: {:?}", String::from_utf8_lossy(&query)))?;
        Ok(resp.into_inner().data)
    }

    pub async fn balance(&self, address: &AccountId, denom: &str) -> Result<u128> {
        let mut client = BankQueryClient::new(self.channel.clone());
        let resp = client
            .balance(QueryBalanceRequest {
                address: address.to_string(),
                denom: denom.to_string(),
            })
            .await?
            .into_inner();
        Ok(resp
            .balance
            .map(|coin| amount_of(&[coin], denom))
            .unwrap_or_default())
    }

    pub async fn spendable_balances(
        &self,
        address: &AccountId,
        pagination: Option<PageRequest>,
    ) -> Result<QuerySpendableBalancesResponse> {
        let mut client = BankQueryClient::new(self.channel.clone());
        let resp = client
            .spendable_balances(QuerySpendableBalancesRequest {
                address: address.to_string(),
                pagination,
            })
            .await?;
        Ok(resp.into_inner())
    }

    pub async fn spendable_balance(&self, address: &AccountId, denom: &str) -> Result<u128> {
        let resp = self.spendable_balances(address, None).await?;
        Ok(amount_of(&resp.balances, denom))
    }

    pub async fn account(&self, address: &AccountId) -> Result<ChainAccount> {
        let mut client = AuthQueryClient::new(self.channel.clone());
        let resp = client
            .account(QueryAccountRequest {
                address: address.to_string(),
            })
            .await?
            .into_inner();
        let any = resp
            .account
            .ok_or_else(|| anyhow::anyhow!("account {} not found", address))?;
        ChainAccount::decode(&any)
    }

    pub async fn broadcast_tx(&self, tx_bytes: Vec<u8>) -> Result<TxResponse> {
        let mut client = TxServiceClient::new(self.channel.clone());
        let resp = client
            .broadcast_tx(BroadcastTxRequest {
                tx_bytes,
                mode: BroadcastMode::Sync as i32,
            })
            .await?
            .into_inner();
        resp.tx_response
            .ok_or_else(|| anyhow::anyhow!("broadcast returned no tx response"))
    }

    /// `Ok(None)` while the transaction is not indexed yet.
    pub async fn get_tx(&self, hash: &str) -> Result<Option<TxResponse>> {
        let mut client = TxServiceClient::new(self.channel.clone());
        match client
            .get_tx(GetTxRequest {
                hash: hash.to_string(),
            })
            .await
        {
            Ok(resp) => Ok(resp.into_inner().tx_response),
            Err(status) if status.code() == tonic::Code::NotFound => Ok(None),
            Err(status) => Err(status.into()),
        }
    }
}

#[async_trait]
impl RewardQuerier for CosmosClient {
    async fn withdrawable_rewards(&self, contract: &AccountId, owner: &AccountId) -> Result<TokenAmount> {
        let query = RewardPoolContract::withdrawable_rewards_query(owner);
        let data = self.smart_query(contract, query).await?;
        Ok(RewardPoolContract::parse_rewards(&data)?)
    }
}

/// Signs with the configured key and broadcasts through a [`CosmosClient`].
pub struct SigningClient {
    client: CosmosClient,
    signer: KeySigner,
    chain_id: chain::Id,
    fee: TokenAmount,
    gas_limit: u64,
    memo: String,
    monitor: TransactionMonitor,
}

impl SigningClient {
    pub fn new(client: CosmosClient, signer: KeySigner, config: &ToolsConfig, monitor: TransactionMonitor) -> Result<Self> {
        let chain_id = chain::Id::from_str(&config.chain.chain_id)
            .map_err(|e| anyhow::anyhow!("Invalid chain id {}: {}", config.chain.chain_id, e))?;
        Ok(Self {
            client,
            signer,
            chain_id,
            fee: TokenAmount::new(config.fee_amount()),
            gas_limit: config.transaction.gas_limit,
            memo: config.transaction.memo.clone(),
            monitor,
        })
    }

    async fn sign(&self, messages: &[CompoundMsg]) -> Result<Vec<u8>> {
        let account = self.client.account(self.signer.account_id()).await?;
        let base = account
            .base_account()
            .ok_or_else(|| anyhow::anyhow!("account {} has no base account", self.signer.account_id()))?;
        debug!(
            account_number = base.account_number,
            sequence = base.sequence,
            "signing compound transaction"
        );
        self.build_tx(messages, base.account_number, base.sequence)
    }

    /// Signed, encoded transaction carrying all `messages`.
    pub fn build_tx(&self, messages: &[CompoundMsg], account_number: u64, sequence: u64) -> Result<Vec<u8>> {
        let anys = messages
            .iter()
            .map(|m| m.to_any())
            .collect::<Result<Vec<_>, _>>()?;

        let body = Body::new(anys, self.memo.clone(), 0u32);
        let fee = Fee::from_amount_and_gas(self.fee.to_coin()?, self.gas_limit);
        let auth_info = SignerInfo::single_direct(Some(self.signer.public_key()), sequence).auth_info(fee);
        let sign_doc = SignDoc::new(&body, &auth_info, &self.chain_id, account_number)
            .map_err(|e| anyhow::anyhow!("Failed to build sign doc: {}", e))?;
        let raw = sign_doc
            .sign(self.signer.signing_key())
            .map_err(|e| anyhow::anyhow!("Failed to sign transaction: {}", e))?;
        raw.to_bytes()
            .map_err(|e| anyhow::anyhow!("Failed to encode transaction: {}", e))
    }
}

#[async_trait]
impl TransactionSubmitter for SigningClient {
    async fn submit(&self, messages: &[CompoundMsg]) -> Result<TxOutcome> {
        let tx_bytes = self.sign(messages).await?;
        let resp = self.client.broadcast_tx(tx_bytes).await?;
        if resp.code != 0 {
            return Err(anyhow::anyhow!(
                "transaction {} rejected with code {}: {}",
                resp.txhash,
                resp.code,
                resp.raw_log
            ));
        }
        println!("✅ Compound transaction sent: {}", resp.txhash);
        info!(tx_hash = %resp.txhash, fee = %self.fee, denom = STAKE_DENOM, "broadcast compound transaction");

        let receipt = self.monitor.monitor_transaction(&resp.txhash).await?;
        match receipt.status {
            TransactionStatus::Success => Ok(TxOutcome {
                tx_hash: receipt.hash,
                height: receipt.height,
                gas_used: receipt.gas_used,
            }),
            TransactionStatus::Failed => Err(anyhow::anyhow!(
                "transaction {} failed with code {}: {}",
                receipt.hash,
                receipt.code,
                receipt.raw_log
            )),
            TransactionStatus::Timeout => Err(anyhow::anyhow!(
                "transaction {} monitoring timeout",
                receipt.hash
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_checks_prefix() {
        let addr = "tgrade1wl59k23zngj34l7d42y9yltask7rjlnxgccawc7ltrknp6n52fps2p2ent";
        assert!(CosmosClient::parse_address(addr, "tgrade").is_ok());
        assert!(matches!(
            CosmosClient::parse_address(addr, "juno"),
            Err(CompoundError::InvalidAddress { .. })
        ));
        assert!(CosmosClient::parse_address("tgrade1notbech32", "tgrade").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_node_surfaces_query_error() {
        let channel = Endpoint::from_static("http://127.0.0.1:1").connect_lazy();
        let client = CosmosClient::from_channel(channel);
        let contract = AccountId::from_str(crate::config::MAINNET_DISTRIBUTION_ADDR).unwrap();
        let owner = AccountId::new("tgrade", &[1u8; 20]).unwrap();

        assert!(client.withdrawable_rewards(&contract, &owner).await.is_err());
        assert!(client.balance(&owner, STAKE_DENOM).await.is_err());
    }

    #[tokio::test]
    async fn test_build_tx_carries_all_messages() {
        let signer = KeySigner::from_hex(
            "0101010101010101010101010101010101010101010101010101010101010101",
            "tgrade",
        )
        .unwrap();
        let owner = signer.account_id().clone();
        let contract = AccountId::from_str(crate::config::MAINNET_ENGAGEMENT_ADDR).unwrap();

        let client = CosmosClient::from_channel(Endpoint::from_static("http://127.0.0.1:1").connect_lazy());
        let config = ToolsConfig::default();
        let monitor = TransactionMonitor::new(
            client.clone(),
            std::time::Duration::from_secs(1),
            std::time::Duration::from_millis(10),
        );
        let signing = SigningClient::new(client, signer, &config, monitor).unwrap();

        let messages = vec![
            CompoundMsg::WithdrawRewards {
                contract,
                sender: owner.clone(),
                receiver: owner.clone(),
            },
            CompoundMsg::Delegate {
                operator: owner,
                amount: TokenAmount::new(2_980_000),
            },
        ];
        let bytes = signing.build_tx(&messages, 5, 9).unwrap();
        let tx = cosmrs::Tx::from_bytes(&bytes).unwrap();

        assert_eq!(tx.body.messages.len(), 2);
        assert_eq!(tx.body.messages[0].type_url, "/cosmwasm.wasm.v1.MsgExecuteContract");
        assert_eq!(tx.body.messages[1].type_url, crate::contracts::poe::MSG_DELEGATE_TYPE_URL);
        assert_eq!(tx.auth_info.fee.gas_limit, 400_000);
        assert_eq!(tx.auth_info.fee.amount[0].amount, 20_000);
        assert_eq!(tx.auth_info.signer_infos[0].sequence, 9);
        assert_eq!(tx.signatures.len(), 1);
    }

    #[test]
    fn test_decode_base_account() {
        let base = BaseAccount {
            address: "tgrade1xyz".to_string(),
            pub_key: None,
            account_number: 7,
            sequence: 3,
        };
        let any = Any {
            type_url: BASE_ACCOUNT_TYPE_URL.to_string(),
            value: base.encode_to_vec(),
        };
        let account = ChainAccount::decode(&any).unwrap();
        assert_eq!(account.base_account().unwrap().sequence, 3);
        assert_eq!(account.type_url(), BASE_ACCOUNT_TYPE_URL);
    }

    #[test]
    fn test_decode_unknown_account_type() {
        let any = Any {
            type_url: "/foo.Bar".to_string(),
            value: vec![],
        };
        assert!(ChainAccount::decode(&any).is_err());
    }
}
