//! Ledger configuration.

use serde::Deserialize;

use crate::constants::{DEFAULT_DIFFICULTY, HASH_HEX_SIZE};
use crate::error::LedgerError;
use crate::pow::MiningStrategy;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    /// Leading zero hex characters a mined block hash must carry.
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    #[serde(default)]
    pub strategy: MiningStrategy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            strategy: MiningStrategy::default(),
        }
    }
}

impl LedgerConfig {
    pub fn with_difficulty(difficulty: u32) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    /// A difficulty past the digest length can never be met, so mining
    /// would never return.
    pub fn validate(&self) -> Result<(), LedgerError> {
        let max = HASH_HEX_SIZE as u32;
        if self.difficulty > max {
            return Err(LedgerError::DifficultyTooHigh {
                difficulty: self.difficulty,
                max,
            });
        }
        Ok(())
    }

    /// Parse a TOML document. Missing keys fall back to defaults.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

fn default_difficulty() -> u32 {
    DEFAULT_DIFFICULTY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = LedgerConfig::from_toml("").unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.difficulty, DEFAULT_DIFFICULTY);
        assert_eq!(config.strategy, MiningStrategy::Sequential);
    }

    #[test]
    fn document_overrides_defaults() {
        let config = LedgerConfig::from_toml("difficulty = 4\nstrategy = \"parallel\"\n").unwrap();
        assert_eq!(config.difficulty, 4);
        assert_eq!(config.strategy, MiningStrategy::Parallel);
    }

    #[test]
    fn difficulty_is_capped_at_digest_length() {
        assert_eq!(LedgerConfig::with_difficulty(64).validate(), Ok(()));
        assert_eq!(LedgerConfig::with_difficulty(0).validate(), Ok(()));
        assert_eq!(
            LedgerConfig::with_difficulty(65).validate(),
            Err(LedgerError::DifficultyTooHigh {
                difficulty: 65,
                max: 64
            })
        );
        let parsed = LedgerConfig::from_toml("difficulty = 100").unwrap();
        assert!(parsed.validate().is_err());
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        assert!(LedgerConfig::from_toml("strategy = \"gpu\"").is_err());
    }
}
