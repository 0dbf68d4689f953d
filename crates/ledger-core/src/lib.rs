pub mod constants;
pub mod error;
pub mod ledger;
pub mod mine;

use constants::HASH_SIZE;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use error::{LedgerError, Result};
pub use ledger::{generate_block, is_block_valid, validate_block, validate_chain, Ledger};
pub use mine::CancelFlag;
pub use pow::Difficulty;

pub type Hash = [u8; HASH_SIZE];

/// Current wall-clock time in the form stored on blocks.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// SHA-256 over the decimal/text concatenation
/// `index ‖ timestamp ‖ payload ‖ prev_hash ‖ nonce` with no separators.
pub fn content_hash(
    index: u64,
    timestamp: &str,
    payload: i64,
    prev_hash: &str,
    nonce: u64,
) -> Hash {
    BlockTemplate {
        index,
        timestamp: timestamp.to_owned(),
        payload,
        prev_hash: prev_hash.to_owned(),
    }
    .hash_with_nonce(nonce)
}

pub fn content_hash_hex(
    index: u64,
    timestamp: &str,
    payload: i64,
    prev_hash: &str,
    nonce: u64,
) -> String {
    hex::encode(content_hash(index, timestamp, payload, prev_hash, nonce))
}

/// Decode a stored hex hash. Anything that is not exactly 32 bytes of hex is `None`.
pub fn decode_hash(hex_hash: &str) -> Option<Hash> {
    let mut out = [0u8; HASH_SIZE];
    hex::decode_to_slice(hex_hash, &mut out).ok()?;
    Some(out)
}

/// Every block field except `hash` and `nonce`; what the miner works on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockTemplate {
    pub index: u64,
    pub timestamp: String,
    pub payload: i64,
    pub prev_hash: String,
}

impl BlockTemplate {
    /// Template for the successor of `prev`, stamped with the current time.
    pub fn next(prev: &Block, payload: i64) -> Result<Self> {
        let index = prev
            .index
            .checked_add(1)
            .ok_or(LedgerError::IndexOverflow { index: prev.index })?;
        Ok(Self {
            index,
            timestamp: now_timestamp(),
            payload,
            prev_hash: prev.hash.clone(),
        })
    }

    /// Hasher already fed with everything that precedes the nonce.
    pub fn prefix_hasher(&self) -> Sha256 {
        let mut hasher = Sha256::new();
        hasher.update(self.index.to_string());
        hasher.update(&self.timestamp);
        hasher.update(self.payload.to_string());
        hasher.update(&self.prev_hash);
        hasher
    }

    pub fn hash_with_nonce(&self, nonce: u64) -> Hash {
        finish_with_nonce(&self.prefix_hasher(), nonce)
    }

    pub fn seal(self, hash: String, nonce: u64) -> Block {
        Block {
            index: self.index,
            timestamp: self.timestamp,
            payload: self.payload,
            prev_hash: self.prev_hash,
            hash,
            nonce,
        }
    }
}

pub(crate) fn finish_with_nonce(prefix: &Sha256, nonce: u64) -> Hash {
    let digest = prefix.clone().chain_update(nonce.to_string()).finalize();
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&digest[..]);
    out
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "Index")]
    pub index: u64,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "BPM")]
    pub payload: i64,
    #[serde(rename = "Hash")]
    pub hash: String,
    #[serde(rename = "PrevHash")]
    pub prev_hash: String,
    #[serde(rename = "Nonce")]
    pub nonce: u64,
}

impl Block {
    /// The hash-less first block of every chain.
    pub fn genesis() -> Self {
        Self {
            index: 0,
            timestamp: now_timestamp(),
            payload: 0,
            hash: String::new(),
            prev_hash: String::new(),
            nonce: 0,
        }
    }

    pub fn template(&self) -> BlockTemplate {
        BlockTemplate {
            index: self.index,
            timestamp: self.timestamp.clone(),
            payload: self.payload,
            prev_hash: self.prev_hash.clone(),
        }
    }

    /// Recompute the content hash from the block's own fields.
    pub fn compute_hash(&self) -> Hash {
        self.template().hash_with_nonce(self.nonce)
    }

    pub fn compute_hash_hex(&self) -> String {
        hex::encode(self.compute_hash())
    }
}

pub mod pow {
    use super::{constants::HASH_BITS, constants::POW_TARGET_BITS, Hash, LedgerError, Result};
    use primitive_types::U256;

    /// Number of high bits the hash must clear; the target is `2^(256 - bits)`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Difficulty(u32);

    impl Difficulty {
        pub fn new(target_bits: u32) -> Result<Self> {
            if target_bits == 0 || target_bits >= HASH_BITS {
                return Err(LedgerError::InvalidDifficulty(target_bits));
            }
            Ok(Self(target_bits))
        }

        pub fn target_bits(self) -> u32 {
            self.0
        }

        pub fn target(self) -> U256 {
            U256::one() << ((HASH_BITS - self.0) as usize)
        }
    }

    impl Default for Difficulty {
        fn default() -> Self {
            Self(POW_TARGET_BITS)
        }
    }

    /// The digest read as a big-endian 256-bit integer must be strictly below the target.
    pub fn hash_meets_target(hash: &Hash, difficulty: Difficulty) -> bool {
        U256::from_big_endian(hash) < difficulty.target()
    }
}
