use tracing::{info, warn};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::pow::{self, MiningStrategy};
use crate::{Block, BlockHash, SealedBlock, Transaction};

/// Owns the sealed chain and the pending buffer. All mutation goes through
/// `add_new_transaction`, `mine` and `add_block`.
#[derive(Clone, Debug)]
pub struct Ledger {
    chain: Vec<SealedBlock>,
    pending: Vec<Transaction>,
    difficulty: u32,
    strategy: MiningStrategy,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::with_config(&LedgerConfig::default())
    }
}

impl Ledger {
    pub fn new(difficulty: u32) -> Self {
        Self::with_config(&LedgerConfig::with_difficulty(difficulty))
    }

    /// Fresh ledger holding only the genesis block. Genesis is hashed but
    /// not mined.
    pub fn with_config(config: &LedgerConfig) -> Self {
        let genesis = Block::genesis();
        let hash = genesis.compute_hash();
        Self {
            chain: vec![SealedBlock::seal(genesis, hash)],
            pending: Vec::new(),
            difficulty: config.difficulty,
            strategy: config.strategy,
        }
    }

    /// Rebuild a ledger from an exported chain. The chain must start at a
    /// genesis block and pass [`validate_chain`].
    pub fn from_chain(chain: Vec<SealedBlock>, config: &LedgerConfig) -> Result<Self> {
        let genesis = chain.first().ok_or(LedgerError::EmptyChain)?;
        if genesis.index() != 0 || genesis.previous_hash().is_some() {
            return Err(LedgerError::ChainInvalid { index: 0 });
        }
        validate_chain(&chain, config.difficulty)?;
        Ok(Self {
            chain,
            pending: Vec::new(),
            difficulty: config.difficulty,
            strategy: config.strategy,
        })
    }

    pub fn chain(&self) -> &[SealedBlock] {
        &self.chain
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Always false: the chain holds genesis from construction.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// The tip.
    pub fn last_block(&self) -> &SealedBlock {
        // never empty: constructors guarantee a genesis block
        &self.chain[self.chain.len() - 1]
    }

    pub fn add_new_transaction(&mut self, record: impl Into<Transaction>) {
        self.pending.push(record.into());
    }

    /// Seal every pending transaction into one new block. Returns the new
    /// block's index; pending is cleared only on success.
    pub fn mine(&mut self) -> Result<u64> {
        if self.pending.is_empty() {
            return Err(LedgerError::EmptyPendingSet);
        }

        let tip = self.last_block();
        let mut candidate = Block::new(
            tip.index() + 1,
            Some(tip.hash().clone()),
            self.pending.clone(),
        );
        let proof = self.proof_of_work(&mut candidate)?;
        let index = self.add_block(candidate, proof)?.index();
        self.pending.clear();
        Ok(index)
    }

    /// Search a nonce for `block` with the configured strategy.
    pub fn proof_of_work(&self, block: &mut Block) -> Result<BlockHash> {
        match self.strategy {
            MiningStrategy::Sequential => Ok(pow::proof_of_work(block, self.difficulty)),
            MiningStrategy::Parallel => pow::proof_of_work_parallel(block, self.difficulty)
                .ok_or(LedgerError::NonceSpaceExhausted { index: block.index }),
        }
    }

    /// Admit `block` if it directly follows the tip and `claimed_hash` is a
    /// valid proof for it. Sealing consumes the candidate.
    pub fn add_block(&mut self, block: Block, claimed_hash: BlockHash) -> Result<&SealedBlock> {
        let tip = self.last_block();
        let expected_index = tip.index() + 1;
        if block.index != expected_index {
            warn!(index = block.index, expected_index, "rejected block: wrong index");
            return Err(LedgerError::IndexMismatch {
                expected: expected_index,
                found: block.index,
            });
        }

        let tip_hash = tip.hash();
        if block.previous_hash.as_ref() != Some(tip_hash) {
            warn!(index = block.index, "rejected block: does not extend the tip");
            return Err(LedgerError::LinkageMismatch {
                index: block.index,
                expected: tip_hash.clone(),
                found: block.previous_hash,
            });
        }

        if !self.is_valid_proof(&block, &claimed_hash) {
            warn!(index = block.index, hash = %claimed_hash, "rejected block: invalid proof");
            return Err(LedgerError::ProofInvalid { index: block.index });
        }

        info!(
            "Sealed block {} with nonce {} and hash {}",
            block.index, block.nonce, claimed_hash
        );
        self.chain.push(SealedBlock::seal(block, claimed_hash));
        Ok(self.last_block())
    }

    /// `claimed_hash` meets the difficulty and is the block's real hash.
    pub fn is_valid_proof(&self, block: &Block, claimed_hash: &BlockHash) -> bool {
        is_valid_proof(block, claimed_hash, self.difficulty)
    }

    pub fn check_chain_validity(&self) -> bool {
        self.verify_chain().is_ok()
    }

    /// Like [`Ledger::check_chain_validity`] but names the first bad block.
    pub fn verify_chain(&self) -> Result<()> {
        validate_chain(&self.chain, self.difficulty)
    }

    #[cfg(test)]
    pub(crate) fn chain_mut(&mut self) -> &mut Vec<SealedBlock> {
        &mut self.chain
    }
}

pub fn is_valid_proof(block: &Block, claimed_hash: &BlockHash, difficulty: u32) -> bool {
    claimed_hash.meets_difficulty(difficulty) && *claimed_hash == block.compute_hash()
}

/// Re-verify a chain from scratch. The block at position 0 is accepted as is;
/// every later block must carry its position as its index, a valid proof, and
/// a link to its predecessor. Errors name the position of the first bad block.
pub fn validate_chain(chain: &[SealedBlock], difficulty: u32) -> Result<()> {
    let mut previous_hash: Option<&BlockHash> = None;
    for (position, block) in chain.iter().enumerate() {
        let position = position as u64;
        if position == 0 {
            previous_hash = Some(block.hash());
            continue;
        }
        if block.index() != position
            || !is_valid_proof(block.block(), block.hash(), difficulty)
            || block.previous_hash() != previous_hash
        {
            warn!(position, index = block.index(), "chain validation failed");
            return Err(LedgerError::ChainInvalid { index: position });
        }
        previous_hash = Some(block.hash());
    }
    Ok(())
}
