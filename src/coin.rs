use crate::error::CompoundError;
use regex::Regex;
use std::fmt;

/// Base staking denomination. Every amount handled by the tools is in this unit.
pub const STAKE_DENOM: &str = "utgd";
/// Display denomination, `1tgd = 1_000_000utgd`.
pub const DISPLAY_DENOM: &str = "tgd";
pub const DISPLAY_EXPONENT: u32 = 6;

const COIN_PATTERN: &str = r"^([0-9]+(?:\.[0-9]+)?)\s*([a-zA-Z][a-zA-Z0-9/:._-]{1,127})$";

/// An amount of the staking token in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(0);

    pub fn new(base_units: u128) -> Self {
        Self(base_units)
    }

    pub fn base_units(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_add(other.0).map(TokenAmount)
    }

    pub fn checked_sub(self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_sub(other.0).map(TokenAmount)
    }

    /// Parses `<number><denom>` where denom is `utgd` (integer only) or `tgd`
    /// (up to six fractional digits).
    pub fn parse(input: &str) -> Result<Self, CompoundError> {
        let input = input.trim();
        let re = Regex::new(COIN_PATTERN).map_err(|e| CompoundError::InvalidAmount(e.to_string()))?;
        let caps = re
            .captures(input)
            .ok_or_else(|| CompoundError::InvalidAmount(format!("invalid coin expression: {input:?}")))?;

        let number = &caps[1];
        let denom = &caps[2];

        match denom {
            STAKE_DENOM => {
                if number.contains('.') {
                    return Err(CompoundError::InvalidAmount(format!(
                        "{STAKE_DENOM} amounts must be integers: {input:?}"
                    )));
                }
                let units = number
                    .parse::<u128>()
                    .map_err(|e| CompoundError::InvalidAmount(format!("{input:?}: {e}")))?;
                Ok(Self(units))
            }
            DISPLAY_DENOM => Self::from_display(number, input),
            other => Err(CompoundError::DenomMismatch {
                expected: STAKE_DENOM.to_string(),
                found: other.to_string(),
            }),
        }
    }

    /// Same as [`TokenAmount::parse`] but rejects zero.
    pub fn parse_non_zero(input: &str) -> Result<Self, CompoundError> {
        let amount = Self::parse(input)?;
        if amount.is_zero() {
            return Err(CompoundError::ZeroAmount(input.trim().to_string()));
        }
        Ok(amount)
    }

    fn from_display(number: &str, input: &str) -> Result<Self, CompoundError> {
        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if fraction.len() > DISPLAY_EXPONENT as usize {
            return Err(CompoundError::InvalidAmount(format!(
                "{input:?} has more than {DISPLAY_EXPONENT} decimal places"
            )));
        }

        let scale = 10u128.pow(DISPLAY_EXPONENT);
        let whole_units = whole
            .parse::<u128>()
            .map_err(|e| CompoundError::InvalidAmount(format!("{input:?}: {e}")))?
            .checked_mul(scale)
            .ok_or_else(|| CompoundError::InvalidAmount(format!("{input:?} overflows")))?;

        let fraction_units = if fraction.is_empty() {
            0
        } else {
            let padded = format!("{fraction:0<width$}", width = DISPLAY_EXPONENT as usize);
            padded
                .parse::<u128>()
                .map_err(|e| CompoundError::InvalidAmount(format!("{input:?}: {e}")))?
        };

        whole_units
            .checked_add(fraction_units)
            .map(Self)
            .ok_or_else(|| CompoundError::InvalidAmount(format!("{input:?} overflows")))
    }

    /// Checks a `(denom, amount)` pair reported by the chain.
    pub fn from_chain(denom: &str, amount: &str) -> Result<Self, CompoundError> {
        let units = amount
            .trim()
            .parse::<u128>()
            .map_err(|e| CompoundError::InvalidAmount(format!("amount {amount:?}: {e}")))?;
        // Contracts report an empty denom for a zero balance.
        if units == 0 {
            return Ok(Self::ZERO);
        }
        if denom != STAKE_DENOM {
            return Err(CompoundError::DenomMismatch {
                expected: STAKE_DENOM.to_string(),
                found: denom.to_string(),
            });
        }
        Ok(Self(units))
    }

    pub fn to_coin(&self) -> Result<cosmrs::Coin, CompoundError> {
        let denom = STAKE_DENOM
            .parse::<cosmrs::Denom>()
            .map_err(|e| CompoundError::InvalidAmount(e.to_string()))?;
        Ok(cosmrs::Coin {
            denom,
            amount: self.0,
        })
    }

    pub fn to_proto_coin(&self) -> cosmos_sdk_proto::cosmos::base::v1beta1::Coin {
        cosmos_sdk_proto::cosmos::base::v1beta1::Coin {
            denom: STAKE_DENOM.to_string(),
            amount: self.0.to_string(),
        }
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0, STAKE_DENOM)
    }
}

/// Picks the staking denom out of a coin list, zero when absent.
pub fn amount_of(coins: &[cosmos_sdk_proto::cosmos::base::v1beta1::Coin], denom: &str) -> u128 {
    coins
        .iter()
        .filter(|c| c.denom == denom)
        .filter_map(|c| c.amount.parse::<u128>().ok())
        .sum()
}
