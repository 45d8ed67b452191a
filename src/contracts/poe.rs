use crate::coin::TokenAmount;
use cosmos_sdk_proto::cosmos::base::v1beta1::Coin as ProtoCoin;
use cosmos_sdk_proto::Any;
use cosmrs::AccountId;
use prost::Message;

pub const MSG_DELEGATE_TYPE_URL: &str = "/confio.poe.v1beta1.MsgDelegate";

/// Proof-of-engagement self delegation, `confio.poe.v1beta1.MsgDelegate`.
#[derive(Clone, PartialEq, Message)]
pub struct MsgDelegate {
    #[prost(string, tag = "1")]
    pub operator_address: String,
    #[prost(message, optional, tag = "2")]
    pub amount: Option<ProtoCoin>,
    #[prost(message, optional, tag = "3")]
    pub vesting_amount: Option<ProtoCoin>,
}

impl MsgDelegate {
    /// Liquid delegation with an empty vesting part.
    pub fn liquid(operator: &AccountId, amount: TokenAmount) -> Self {
        Self {
            operator_address: operator.to_string(),
            amount: Some(amount.to_proto_coin()),
            vesting_amount: Some(TokenAmount::ZERO.to_proto_coin()),
        }
    }

    pub fn to_any(&self) -> Any {
        Any {
            type_url: MSG_DELEGATE_TYPE_URL.to_string(),
            value: self.encode_to_vec(),
        }
    }
}
