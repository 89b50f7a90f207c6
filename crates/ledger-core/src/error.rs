use thiserror::Error;

use crate::constants::MAX_DIFFICULTY;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("chain has no blocks")]
    EmptyChain,

    #[error("cannot tamper with block {index}: chain has {len} blocks")]
    TamperOutOfRange { index: usize, len: usize },

    #[error("difficulty {0} exceeds the maximum of {max} hex zeros", max = MAX_DIFFICULTY)]
    DifficultyOutOfRange(u32),

    #[error("no nonce up to {max_nonce} satisfies the target for block {index}")]
    NonceSpaceExhausted { index: u64, max_nonce: u64 },
}

pub type Result<T> = std::result::Result<T, LedgerError>;
