pub mod chain;
pub mod constants;
pub mod error;
pub mod mine;

pub use chain::{Chain, Check, Violation};
pub use error::ChainError;
pub use mine::MiningStrategy;

use crate::constants::{GENESIS_PAYLOAD, GENESIS_PREVIOUS_HASH};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub type Hash = [u8; 32];

/// Milliseconds since the Unix epoch. A clock set before 1970 reads as 0.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(millis_saturating)
        .unwrap_or_default()
}

fn millis_saturating(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    /// Creation time in Unix epoch milliseconds.
    pub timestamp: u64,
    pub payload: String,
    #[serde(with = "hex::serde")]
    pub previous_hash: Hash,
    pub nonce: u64,
    #[serde(with = "hex::serde")]
    pub hash: Hash,
}

impl Block {
    /// Builds an unmined block with `nonce = 0` and its hash already computed.
    pub fn new(index: u64, timestamp: u64, payload: impl Into<String>, previous_hash: Hash) -> Self {
        let mut block = Self {
            index,
            timestamp,
            payload: payload.into(),
            previous_hash,
            nonce: 0,
            hash: [0u8; 32],
        };
        block.hash = block.compute_hash();
        block
    }

    /// The chain's root of trust. Its hash is computed but never mined.
    pub fn genesis(timestamp: u64) -> Self {
        Self::new(0, timestamp, GENESIS_PAYLOAD, GENESIS_PREVIOUS_HASH)
    }

    pub fn compute_hash(&self) -> Hash {
        self.hash_with_nonce(self.nonce)
    }

    /// Hash this block would carry with `nonce`, leaving the block untouched.
    pub fn hash_with_nonce(&self, nonce: u64) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.preimage(nonce).as_bytes());
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest[..]);
        out
    }

    /// Canonical encoding: compact JSON with lexicographically sorted keys
    /// (`index`, `nonce`, `payload`, `previous_hash`, `timestamp`). Relies on
    /// serde_json's default BTreeMap-backed objects; the `preserve_order`
    /// feature must stay off.
    pub fn preimage(&self, nonce: u64) -> String {
        serde_json::json!({
            "index": self.index,
            "nonce": nonce,
            "payload": self.payload,
            "previous_hash": hex::encode(self.previous_hash),
            "timestamp": self.timestamp,
        })
        .to_string()
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    pub fn previous_hash_hex(&self) -> String {
        hex::encode(self.previous_hash)
    }

    pub fn is_consistent(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

pub mod pow {
    use super::{Block, Hash};
    use crate::constants::PROGRESS_INTERVAL;
    use std::time::{Duration, Instant};
    use tracing::debug;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct MiningReport {
        pub nonce: u64,
        pub attempts: u64,
        pub elapsed: Duration,
    }

    /// Mine the block in place by incrementing nonce until its hex hash starts
    /// with `difficulty` zeros. The current nonce is tried first, so difficulty
    /// 0 always succeeds on the first attempt.
    pub fn mine(block: &mut Block, difficulty: u32) -> MiningReport {
        let started = Instant::now();
        let mut attempts = 1u64;
        block.hash = block.compute_hash();
        while !meets_difficulty(&block.hash, difficulty) {
            block.nonce = block.nonce.wrapping_add(1);
            block.hash = block.compute_hash();
            attempts += 1;
            if attempts % PROGRESS_INTERVAL == 0 {
                debug!(index = block.index, attempts, "still mining");
            }
        }
        MiningReport {
            nonce: block.nonce,
            attempts,
            elapsed: started.elapsed(),
        }
    }

    /// Number of leading zero hex characters in the hash.
    pub fn count_leading_zero_nibbles(hash: &Hash) -> u32 {
        let mut total = 0u32;
        for b in hash {
            if *b == 0 {
                total += 2;
            } else {
                if *b < 0x10 {
                    total += 1;
                }
                break;
            }
        }
        total
    }

    pub fn meets_difficulty(hash: &Hash, difficulty: u32) -> bool {
        count_leading_zero_nibbles(hash) >= difficulty
    }
}
