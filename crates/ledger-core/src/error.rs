use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The candidate broke one of the linkage or proof-of-work rules.
    #[error("invalid block: {0}")]
    InvalidBlock(String),

    #[error("block {index} has no successor index")]
    IndexOverflow { index: u64 },

    #[error("nonce space exhausted while mining block {index}")]
    MiningExhausted { index: u64 },

    #[error("mining of block {index} cancelled after {attempts} attempts")]
    MiningCancelled { index: u64, attempts: u64 },

    #[error("target bits must be within 1..=255, got {0}")]
    InvalidDifficulty(u32),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
