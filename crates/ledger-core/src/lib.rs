//! Append-only proof-of-work ledger: opaque transaction records are queued,
//! mined into hash-linked blocks and re-verifiable from the exported chain
//! alone.

pub mod block;
pub mod config;
pub mod constants;
pub mod error;
pub mod ledger;
pub mod pow;
pub mod shared;

pub use block::{Block, BlockHash, SealedBlock, Transaction};
pub use config::LedgerConfig;
pub use error::LedgerError;
pub use ledger::{validate_chain, Ledger};
pub use pow::MiningStrategy;
pub use shared::SharedLedger;
