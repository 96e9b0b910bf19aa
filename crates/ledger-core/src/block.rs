use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::GENESIS_MARKER;

/// An opaque transaction record. The ledger orders and hashes these but never
/// looks inside.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transaction(Value);

impl Transaction {
    pub fn new(record: impl Into<Value>) -> Self {
        Self(record.into())
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Transaction {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<&str> for Transaction {
    fn from(value: &str) -> Self {
        Self(Value::String(value.to_owned()))
    }
}

impl From<String> for Transaction {
    fn from(value: String) -> Self {
        Self(Value::String(value))
    }
}

/// Lowercase hex SHA-256 digest of a block's canonical encoding.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockHash(String);

impl BlockHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of leading `'0'` hex characters.
    pub fn leading_zeros(&self) -> u32 {
        self.0.chars().take_while(|c| *c == '0').count() as u32
    }

    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        self.leading_zeros() >= difficulty
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for BlockHash {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for BlockHash {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// A candidate block. Mutable while the miner searches for a nonce; becomes a
/// [`SealedBlock`] once admitted to the chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    /// `None` only for genesis.
    pub previous_hash: Option<BlockHash>,
    pub timestamp: u64,
    pub payload: Vec<Transaction>,
    pub nonce: u64,
}

impl Block {
    pub fn new(index: u64, previous_hash: Option<BlockHash>, payload: Vec<Transaction>) -> Self {
        Self::with_timestamp(index, previous_hash, unix_now(), payload)
    }

    pub fn with_timestamp(
        index: u64,
        previous_hash: Option<BlockHash>,
        timestamp: u64,
        payload: Vec<Transaction>,
    ) -> Self {
        Self {
            index,
            previous_hash,
            timestamp,
            payload,
            nonce: 0,
        }
    }

    pub fn genesis() -> Self {
        Self::new(0, None, vec![Transaction::from(GENESIS_MARKER)])
    }

    pub fn compute_hash(&self) -> BlockHash {
        self.hash_with_nonce(self.nonce)
    }

    /// Digest this block would have if its nonce were `nonce`.
    pub fn hash_with_nonce(&self, nonce: u64) -> BlockHash {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_bytes(nonce));
        BlockHash(hex::encode(hasher.finalize()))
    }

    /// Compact JSON of every field but the hash, keys sorted at every level.
    fn canonical_bytes(&self, nonce: u64) -> Vec<u8> {
        let payload = self
            .payload
            .iter()
            .map(|tx| canonicalize(tx.as_value()))
            .collect::<Vec<_>>();
        let fields = json!({
            "index": self.index,
            "nonce": nonce,
            "payload": payload,
            "previous_hash": self.previous_hash.as_ref().map(BlockHash::as_str),
            "timestamp": self.timestamp,
        });
        canonicalize(&fields).to_string().into_bytes()
    }
}

/// Rebuild `value` with object keys inserted in sorted order, so the encoding
/// does not depend on how the map was populated.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::with_capacity(map.len());
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key.as_str()]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// A block whose hash has been fixed. Only the ledger seals blocks; exported
/// chains can be read back through `Deserialize` and re-verified.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SealedBlock {
    #[serde(flatten)]
    block: Block,
    hash: BlockHash,
}

impl SealedBlock {
    pub(crate) fn seal(block: Block, hash: BlockHash) -> Self {
        Self { block, hash }
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn index(&self) -> u64 {
        self.block.index
    }

    pub fn previous_hash(&self) -> Option<&BlockHash> {
        self.block.previous_hash.as_ref()
    }

    pub fn timestamp(&self) -> u64 {
        self.block.timestamp
    }

    pub fn payload(&self) -> &[Transaction] {
        &self.block.payload
    }

    pub fn nonce(&self) -> u64 {
        self.block.nonce
    }

    pub fn hash(&self) -> &BlockHash {
        &self.hash
    }

    pub fn compute_hash(&self) -> BlockHash {
        self.block.compute_hash()
    }

    #[cfg(test)]
    pub(crate) fn tamper_payload(&mut self, payload: Vec<Transaction>) {
        self.block.payload = payload;
    }
}
