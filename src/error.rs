use thiserror::Error;

/// Failures of a compound run. Every variant is fatal for the invocation.
#[derive(Debug, Error)]
pub enum CompoundError {
    /// Malformed bech32 address or wrong account prefix.
    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Unparseable coin expression.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("empty amount: {0}")]
    ZeroAmount(String),

    #[error("{expected} denom required, got {found:?}")]
    DenomMismatch { expected: String, found: String },

    /// Smart query against a reward contract failed.
    #[error("query withdrawable rewards from {contract}: {reason}")]
    Query { contract: String, reason: String },

    /// A message failed basic validation before broadcast.
    #[error("invalid {message} message: {reason}")]
    InvalidMessage { message: &'static str, reason: String },

    #[error("broadcast: {0}")]
    Broadcast(String),
}

impl CompoundError {
    /// Input errors are raised before any network call.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CompoundError::InvalidAddress { .. }
                | CompoundError::InvalidAmount(_)
                | CompoundError::ZeroAmount(_)
                | CompoundError::DenomMismatch { .. }
        )
    }
}
