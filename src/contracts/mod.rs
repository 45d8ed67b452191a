pub mod poe;
pub mod reward_pool;

pub use poe::MsgDelegate;
pub use reward_pool::RewardPoolContract;
