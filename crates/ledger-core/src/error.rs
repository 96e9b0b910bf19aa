use thiserror::Error;

use crate::BlockHash;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("no pending transactions to mine")]
    EmptyPendingSet,

    /// The candidate was built against a tip that is no longer the tip.
    #[error(
        "block {index} links to {}, expected current tip {expected}",
        .found.as_ref().map_or("<none>", BlockHash::as_str)
    )]
    LinkageMismatch {
        index: u64,
        expected: BlockHash,
        found: Option<BlockHash>,
    },

    #[error("block index {found} does not follow the tip, expected {expected}")]
    IndexMismatch { expected: u64, found: u64 },

    #[error("difficulty {difficulty} exceeds the {max} hex characters of a block hash")]
    DifficultyTooHigh { difficulty: u32, max: u32 },

    #[error("block {index} carries an invalid proof of work")]
    ProofInvalid { index: u64 },

    #[error("chain is invalid at block {index}")]
    ChainInvalid { index: u64 },

    #[error("chain has no genesis block")]
    EmptyChain,

    #[error("nonce space exhausted while mining block {index}")]
    NonceSpaceExhausted { index: u64 },

    #[error("ledger lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, LedgerError>;
