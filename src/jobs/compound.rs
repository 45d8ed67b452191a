use crate::blockchain::{CosmosClient, SigningClient};
use crate::coin::TokenAmount;
use crate::config::ToolsConfig;
use crate::contracts::{MsgDelegate, RewardPoolContract};
use crate::error::CompoundError;
use crate::retry::{execute_with_retry, RetryConfig};
use crate::signer::KeySigner;
use crate::transaction_monitor::TransactionMonitor;
use anyhow::Result;
use async_trait::async_trait;
use cosmos_sdk_proto::Any;
use cosmrs::tx::Msg;
use cosmrs::AccountId;
use std::time::Duration;
use tracing::{debug, info};

/// Reads the withdrawable reward balance of `owner` at a reward contract.
#[async_trait]
pub trait RewardQuerier: Send + Sync {
    async fn withdrawable_rewards(&self, contract: &AccountId, owner: &AccountId) -> Result<TokenAmount>;
}

/// Signs and broadcasts all messages as one transaction.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    async fn submit(&self, messages: &[CompoundMsg]) -> Result<TxOutcome>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    pub tx_hash: String,
    pub height: i64,
    pub gas_used: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompoundMsg {
    WithdrawRewards {
        contract: AccountId,
        sender: AccountId,
        receiver: AccountId,
    },
    Delegate {
        operator: AccountId,
        amount: TokenAmount,
    },
}

impl CompoundMsg {
    pub fn name(&self) -> &'static str {
        match self {
            CompoundMsg::WithdrawRewards { .. } => "withdraw rewards",
            CompoundMsg::Delegate { .. } => "delegate",
        }
    }

    pub fn validate(&self) -> Result<(), CompoundError> {
        let invalid = |reason: String| CompoundError::InvalidMessage {
            message: self.name(),
            reason,
        };
        match self {
            CompoundMsg::WithdrawRewards {
                contract,
                sender,
                receiver,
            } => {
                if sender != receiver {
                    return Err(invalid(format!("receiver {receiver} differs from sender {sender}")));
                }
                if contract.prefix() != sender.prefix() {
                    return Err(invalid(format!(
                        "contract prefix {:?} does not match sender prefix {:?}",
                        contract.prefix(),
                        sender.prefix()
                    )));
                }
                Ok(())
            }
            CompoundMsg::Delegate { amount, .. } => {
                if amount.is_zero() {
                    return Err(invalid("delegation amount must be positive".to_string()));
                }
                Ok(())
            }
        }
    }

    pub fn to_any(&self) -> Result<Any, CompoundError> {
        self.validate()?;
        match self {
            CompoundMsg::WithdrawRewards {
                contract,
                sender,
                receiver,
            } => RewardPoolContract::new(contract.clone())
                .withdraw_rewards_msg(sender, receiver)
                .to_any()
                .map_err(|e| CompoundError::InvalidMessage {
                    message: self.name(),
                    reason: e.to_string(),
                }),
            CompoundMsg::Delegate { operator, amount } => Ok(MsgDelegate::liquid(operator, *amount).to_any()),
        }
    }
}

/// Minimum claim and reserve, both in utgd.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompoundSettings {
    pub min_amount: TokenAmount,
    pub reserve_amount: TokenAmount,
}

impl CompoundSettings {
    /// Zero minimum is rejected, zero reserve is allowed.
    pub fn parse(min_amount: &str, reserve_amount: &str) -> Result<Self, CompoundError> {
        let min_amount = TokenAmount::parse_non_zero(min_amount)?;
        let reserve_amount = TokenAmount::parse(reserve_amount)?;
        if min_amount.checked_add(reserve_amount).is_none() {
            return Err(CompoundError::InvalidAmount(
                "minimum plus reserve overflows".to_string(),
            ));
        }
        Ok(Self {
            min_amount,
            reserve_amount,
        })
    }

    pub fn threshold(&self) -> TokenAmount {
        // checked in parse
        self.min_amount
            .checked_add(self.reserve_amount)
            .unwrap_or(TokenAmount::new(u128::MAX))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompoundPlan {
    pub messages: Vec<CompoundMsg>,
    pub claimed_total: TokenAmount,
    pub delegated: Option<TokenAmount>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompoundOutcome {
    NothingToClaim,
    DryRun(CompoundPlan),
    Submitted { plan: CompoundPlan, tx: TxOutcome },
}

/// Claims rewards from the reward pools and stakes them back in one transaction.
///
/// A pool is claimed when its reward is strictly above the minimum. The claimed
/// total is delegated, minus the reserve, when it is strictly above
/// minimum + reserve.
pub struct Compounder {
    owner: AccountId,
    sources: Vec<RewardPoolContract>,
    settings: CompoundSettings,
}

impl Compounder {
    pub fn new(owner: AccountId, sources: Vec<RewardPoolContract>, settings: CompoundSettings) -> Self {
        Self {
            owner,
            sources,
            settings,
        }
    }

    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    /// Queries every pool in order and builds the message set. `None` when
    /// nothing qualifies.
    pub async fn plan<Q>(&self, querier: &Q) -> Result<Option<CompoundPlan>, CompoundError>
    where
        Q: RewardQuerier + ?Sized,
    {
        let mut messages = Vec::new();
        let mut claimed_total = TokenAmount::ZERO;

        for source in &self.sources {
            let contract = source.address();
            let rewards = querier
                .withdrawable_rewards(contract, &self.owner)
                .await
                .map_err(|e| CompoundError::Query {
                    contract: contract.to_string(),
                    reason: format!("{e:#}"),
                })?;
            debug!(%contract, %rewards, "withdrawable rewards");

            if rewards > self.settings.min_amount {
                println!("claiming {} rewards: {}", contract, rewards);
                messages.push(CompoundMsg::WithdrawRewards {
                    contract: contract.clone(),
                    sender: self.owner.clone(),
                    receiver: self.owner.clone(),
                });
                claimed_total = claimed_total
                    .checked_add(rewards)
                    .ok_or_else(|| CompoundError::InvalidAmount("claimed total overflows".to_string()))?;
            }
        }

        if messages.is_empty() {
            return Ok(None);
        }

        let mut delegated = None;
        if claimed_total > self.settings.threshold() {
            let amount = claimed_total
                .checked_sub(self.settings.reserve_amount)
                .ok_or_else(|| CompoundError::InvalidAmount("reserve exceeds claimed total".to_string()))?;
            println!("delegating claimed rewards: {}", amount);
            messages.push(CompoundMsg::Delegate {
                operator: self.owner.clone(),
                amount,
            });
            delegated = Some(amount);
        }

        for msg in &messages {
            msg.validate()?;
        }

        Ok(Some(CompoundPlan {
            messages,
            claimed_total,
            delegated,
        }))
    }

    pub async fn run<Q, S>(&self, querier: &Q, submitter: &S, dry_run: bool) -> Result<CompoundOutcome, CompoundError>
    where
        Q: RewardQuerier + ?Sized,
        S: TransactionSubmitter + ?Sized,
    {
        let plan = match self.plan(querier).await? {
            Some(plan) => plan,
            None => {
                println!("no rewards to claim. skipping");
                return Ok(CompoundOutcome::NothingToClaim);
            }
        };

        if dry_run {
            return Ok(CompoundOutcome::DryRun(plan));
        }

        let tx = submitter
            .submit(&plan.messages)
            .await
            .map_err(|e| CompoundError::Broadcast(format!("{e:#}")))?;
        info!(tx_hash = %tx.tx_hash, height = tx.height, "compound transaction included");
        Ok(CompoundOutcome::Submitted { plan, tx })
    }
}

pub struct CompoundJob {
    config: ToolsConfig,
    min_amount: String,
    reserve_amount: String,
    dry_run: bool,
}

impl CompoundJob {
    pub fn new(config: ToolsConfig, min_amount: String, reserve_amount: String, dry_run: bool) -> Self {
        Self {
            config,
            min_amount,
            reserve_amount,
            dry_run,
        }
    }

    pub async fn execute(&self) -> Result<()> {
        println!("🔍 Compound Job Starting...");

        // All input checks happen before connecting.
        let settings = CompoundSettings::parse(&self.min_amount, &self.reserve_amount)?;
        let prefix = &self.config.chain.account_prefix;
        let signer = KeySigner::from_hex(self.config.signer_key()?, prefix)?;
        let owner = CosmosClient::parse_address(&signer.account_id().to_string(), prefix)?;
        let sources = vec![
            RewardPoolContract::new(CosmosClient::parse_address(
                &self.config.contracts.distribution_address,
                prefix,
            )?),
            RewardPoolContract::new(CosmosClient::parse_address(
                &self.config.contracts.engagement_address,
                prefix,
            )?),
        ];

        println!("🔑 Account: {}", owner);
        println!(
            "💰 Minimum claim: {}, reserve: {}",
            settings.min_amount, settings.reserve_amount
        );

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

        let monitor = TransactionMonitor::new(
            client.clone(),
            Duration::from_secs(self.config.monitoring.transaction_timeout_seconds),
            Duration::from_secs(self.config.monitoring.poll_interval_seconds),
        );
        let submitter = SigningClient::new(client.clone(), signer, &self.config, monitor)?;

        let compounder = Compounder::new(owner, sources, settings);
        match compounder.run(&client, &submitter, self.dry_run).await? {
            CompoundOutcome::NothingToClaim => {}
            CompoundOutcome::DryRun(plan) => {
                println!(
                    "✅ DRY RUN: Would broadcast {} message(s), claiming {}",
                    plan.messages.len(),
                    plan.claimed_total
                );
                for msg in &plan.messages {
                    println!("   {:?}", msg);
                }
            }
            CompoundOutcome::Submitted { plan, tx } => {
                println!("🎉 Compound transaction {} confirmed in block {}", tx.tx_hash, tx.height);
                println!("⛽ Gas used: {}", tx.gas_used);
                if plan.delegated.is_none() {
                    println!(
                        "⏳ Claimed {} is not above {}, nothing delegated",
                        plan.claimed_total,
                        settings.threshold()
                    );
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_settings_threshold() {
        let settings = CompoundSettings::parse("2tgd", "20000utgd").unwrap();
        assert_eq!(settings.min_amount, TokenAmount::new(2_000_000));
        assert_eq!(settings.reserve_amount, TokenAmount::new(20_000));
        assert_eq!(settings.threshold(), TokenAmount::new(2_020_000));
    }

    #[test]
    fn test_settings_reject_zero_minimum() {
        assert!(matches!(
            CompoundSettings::parse("0utgd", "1utgd"),
            Err(CompoundError::ZeroAmount(_))
        ));
        assert!(CompoundSettings::parse("1utgd", "0utgd").is_ok());
    }

    #[test]
    fn test_delegate_validation() {
        let operator =
            AccountId::from_str("tgrade14hj2tavq8fpesdwxxcu44rty3hh90vhujrvcmstl4zr3txmfvw9s07fvfr").unwrap();
        let zero = CompoundMsg::Delegate {
            operator: operator.clone(),
            amount: TokenAmount::ZERO,
        };
        assert!(matches!(zero.validate(), Err(CompoundError::InvalidMessage { .. })));
        assert!(zero.to_any().is_err());

        let ok = CompoundMsg::Delegate {
            operator,
            amount: TokenAmount::new(1),
        };
        assert_eq!(ok.to_any().unwrap().type_url, "/confio.poe.v1beta1.MsgDelegate");
    }

    #[test]
    fn test_withdraw_requires_sender_as_receiver() {
        let a = AccountId::from_str("tgrade14hj2tavq8fpesdwxxcu44rty3hh90vhujrvcmstl4zr3txmfvw9s07fvfr").unwrap();
        let b = AccountId::from_str("tgrade1wl59k23zngj34l7d42y9yltask7rjlnxgccawc7ltrknp6n52fps2p2ent").unwrap();
        let msg = CompoundMsg::WithdrawRewards {
            contract: a.clone(),
            sender: a.clone(),
            receiver: b,
        };
        assert!(msg.validate().is_err());

        let msg = CompoundMsg::WithdrawRewards {
            contract: a.clone(),
            sender: a.clone(),
            receiver: a,
        };
        assert_eq!(msg.to_any().unwrap().type_url, "/cosmwasm.wasm.v1.MsgExecuteContract");
    }
}
