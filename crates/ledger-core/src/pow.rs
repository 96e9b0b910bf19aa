use rayon::prelude::*;
use serde::Deserialize;
use tracing::debug;

use crate::{Block, BlockHash};

/// How the nonce space is searched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MiningStrategy {
    /// Linear scan from nonce 0 on the calling thread.
    #[default]
    Sequential,
    /// Nonce space split across the rayon pool, first solution wins.
    Parallel,
}

/// Mine the block by incrementing its nonce from 0 until the hash has at
/// least `difficulty` leading zero hex characters. Leaves the winning nonce on
/// the block and returns the matching hash.
pub fn proof_of_work(block: &mut Block, difficulty: u32) -> BlockHash {
    debug!(index = block.index, difficulty, "starting sequential nonce search");
    block.nonce = 0;
    let mut hash = block.compute_hash();
    while !hash.meets_difficulty(difficulty) {
        block.nonce = block.nonce.wrapping_add(1);
        hash = block.compute_hash();
    }
    hash
}

/// Parallel variant of [`proof_of_work`]. The found nonce is not necessarily
/// the smallest one. Returns `None` only if the whole nonce space fails.
pub fn proof_of_work_parallel(block: &mut Block, difficulty: u32) -> Option<BlockHash> {
    debug!(index = block.index, difficulty, "starting parallel nonce search");
    let template = &*block;
    let (nonce, hash) = (0u64..u64::MAX).into_par_iter().find_map_any(|nonce| {
        let hash = template.hash_with_nonce(nonce);
        hash.meets_difficulty(difficulty).then_some((nonce, hash))
    })?;
    block.nonce = nonce;
    Some(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> Block {
        Block::with_timestamp(
            1,
            Some(BlockHash::from("00c0ffee")),
            1_600_000_000,
            vec!["Alice pays Bob 10".into()],
        )
    }

    #[test]
    fn sequential_search_meets_difficulty() {
        let mut block = candidate();
        let hash = proof_of_work(&mut block, 2);
        assert!(hash.as_str().starts_with("00"));
        assert_eq!(hash, block.compute_hash());
    }

    #[test]
    fn sequential_search_finds_smallest_nonce() {
        let mut block = candidate();
        proof_of_work(&mut block, 2);
        for nonce in 0..block.nonce {
            assert!(!block.hash_with_nonce(nonce).meets_difficulty(2));
        }
    }

    #[test]
    fn sequential_search_restarts_from_zero() {
        let mut fresh = candidate();
        let expected = proof_of_work(&mut fresh, 1);

        let mut dirty = candidate();
        dirty.nonce = 123_456;
        assert_eq!(proof_of_work(&mut dirty, 1), expected);
        assert_eq!(dirty.nonce, fresh.nonce);
    }

    #[test]
    fn zero_difficulty_accepts_first_nonce() {
        let mut block = candidate();
        block.nonce = 99;
        let hash = proof_of_work(&mut block, 0);
        assert_eq!(block.nonce, 0);
        assert_eq!(hash, block.hash_with_nonce(0));
    }

    #[test]
    fn parallel_search_meets_difficulty() {
        let mut block = candidate();
        let hash = proof_of_work_parallel(&mut block, 3).expect("solution");
        assert!(hash.meets_difficulty(3));
        assert_eq!(hash, block.compute_hash());
    }

    #[test]
    fn strategy_parses_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            strategy: MiningStrategy,
        }
        let w: Wrapper = toml::from_str(r#"strategy = "parallel""#).unwrap();
        assert_eq!(w.strategy, MiningStrategy::Parallel);
    }
}
