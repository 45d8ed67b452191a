use crate::coin::TokenAmount;
use crate::error::CompoundError;
use cosmrs::cosmwasm::MsgExecuteContract;
use cosmrs::AccountId;
use serde::Deserialize;
use serde_json::json;

/// Reward distributing contract (distribution or engagement pool).
#[derive(Debug, Clone, PartialEq)]
pub struct RewardPoolContract {
    address: AccountId,
}

#[derive(Debug, Deserialize)]
struct RewardsResponse {
    rewards: RewardCoin,
}

#[derive(Debug, Deserialize)]
struct RewardCoin {
    #[serde(default)]
    denom: String,
    amount: String,
}

impl RewardPoolContract {
    pub fn new(address: AccountId) -> Self {
        Self { address }
    }

    pub fn address(&self) -> &AccountId {
        &self.address
    }

    /// `{"withdrawable_rewards": {"owner": <owner>}}`
    pub fn withdrawable_rewards_query(owner: &AccountId) -> Vec<u8> {
        json!({ "withdrawable_rewards": { "owner": owner.to_string() } })
            .to_string()
            .into_bytes()
    }

    /// Decodes `{"rewards": {"denom": .., "amount": ..}}`.
    pub fn parse_rewards(data: &[u8]) -> Result<TokenAmount, CompoundError> {
        let resp: RewardsResponse =
            serde_json::from_slice(data).map_err(|e| CompoundError::InvalidAmount(format!("unmarshal result: {e}")))?;
        TokenAmount::from_chain(&resp.rewards.denom, &resp.rewards.amount)
    }

    pub fn withdraw_rewards_payload(owner: &AccountId, receiver: &AccountId) -> Vec<u8> {
        json!({
            "withdraw_rewards": {
                "owner": owner.to_string(),
                "receiver": receiver.to_string(),
            }
        })
        .to_string()
        .into_bytes()
    }

    pub fn withdraw_rewards_msg(&self, sender: &AccountId, receiver: &AccountId) -> MsgExecuteContract {
        MsgExecuteContract {
            sender: sender.clone(),
            contract: self.address.clone(),
            msg: Self::withdraw_rewards_payload(sender, receiver),
            funds: vec![],
        }
    }
}
