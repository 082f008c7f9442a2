use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    constants::{GENESIS_PREVIOUS_HASH, MAX_DIFFICULTY},
    now_millis,
    pow::{meets_difficulty, MiningReport},
    Block, ChainError, Hash, MiningStrategy,
};

/// Which validation check a block failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    /// Genesis hash or sentinel previous hash.
    Genesis,
    /// Stored hash differs from the hash recomputed from the block's fields.
    HashConsistency,
    /// `previous_hash` differs from the predecessor's hash.
    PreviousHashLink,
    /// Hash lacks the required leading zeros.
    ProofOfWork,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Check::Genesis => "genesis",
            Check::HashConsistency => "hash consistency",
            Check::PreviousHashLink => "previous-hash link",
            Check::ProofOfWork => "proof of work",
        };
        f.write_str(name)
    }
}

/// First inconsistency found by [`Chain::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("genesis block is not a valid root: stored {}, expected {}", hex::encode(.stored), hex::encode(.computed))]
    Genesis { stored: Hash, computed: Hash },
    #[error("block {index}: stored hash {} does not match recomputed {}", hex::encode(.stored), hex::encode(.computed))]
    HashMismatch {
        index: usize,
        stored: Hash,
        computed: Hash,
    },
    #[error("block {index}: previous hash {} does not link to {}", hex::encode(.found), hex::encode(.expected))]
    BrokenLink {
        index: usize,
        expected: Hash,
        found: Hash,
    },
    #[error("block {index}: hash {} has fewer than {difficulty} leading zeros", hex::encode(.hash))]
    InsufficientWork {
        index: usize,
        hash: Hash,
        difficulty: u32,
    },
}

impl Violation {
    /// Position in the chain of the offending block.
    pub fn index(&self) -> usize {
        match self {
            Violation::Genesis { .. } => 0,
            Violation::HashMismatch { index, .. }
            | Violation::BrokenLink { index, .. }
            | Violation::InsufficientWork { index, .. } => *index,
        }
    }

    pub fn check(&self) -> Check {
        match self {
            Violation::Genesis { .. } => Check::Genesis,
            Violation::HashMismatch { .. } => Check::HashConsistency,
            Violation::BrokenLink { .. } => Check::PreviousHashLink,
            Violation::InsufficientWork { .. } => Check::ProofOfWork,
        }
    }
}

/// In-memory proof-of-work chain. Always holds at least the genesis block.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "ChainParts")]
pub struct Chain {
    blocks: Vec<Block>,
    difficulty: u32,
    strategy: MiningStrategy,
}

/// Unchecked shape of a serialized chain.
#[derive(Deserialize)]
struct ChainParts {
    blocks: Vec<Block>,
    difficulty: u32,
    #[serde(default)]
    strategy: MiningStrategy,
}

impl TryFrom<ChainParts> for Chain {
    type Error = ChainError;

    fn try_from(parts: ChainParts) -> Result<Self, Self::Error> {
        if parts.difficulty > MAX_DIFFICULTY {
            return Err(ChainError::DifficultyOutOfRange {
                difficulty: parts.difficulty,
            });
        }
        if parts.blocks.is_empty() {
            return Err(ChainError::MissingGenesis);
        }
        Ok(Self {
            blocks: parts.blocks,
            difficulty: parts.difficulty,
            strategy: parts.strategy,
        })
    }
}

impl Chain {
    /// Creates a chain rooted at a genesis block stamped with the current time.
    /// Genesis is exempt from proof-of-work; only blocks added later are mined.
    pub fn new(difficulty: u32) -> Result<Self, ChainError> {
        Self::with_strategy(difficulty, MiningStrategy::default())
    }

    pub fn with_strategy(difficulty: u32, strategy: MiningStrategy) -> Result<Self, ChainError> {
        if difficulty > MAX_DIFFICULTY {
            return Err(ChainError::DifficultyOutOfRange { difficulty });
        }
        let genesis = Block::genesis(now_millis());
        debug!(hash = %genesis.hash_hex(), difficulty, "created genesis block");
        Ok(Self {
            blocks: vec![genesis],
            difficulty,
            strategy,
        })
    }

    /// Mines `payload` into a new block linked to the current tip and appends
    /// it. Blocks until proof-of-work succeeds.
    pub fn add_block(&mut self, payload: impl Into<String>) -> &Block {
        self.add_block_with_report(payload).0
    }

    /// Same as [`Chain::add_block`], also returning how the search went.
    pub fn add_block_with_report(&mut self, payload: impl Into<String>) -> (&Block, MiningReport) {
        let index = self.blocks.len() as u64;
        let previous_hash = self.latest().hash;
        let mut block = Block::new(index, now_millis(), payload, previous_hash);
        let report = self.strategy.mine(&mut block, self.difficulty);
        self.blocks.push(block);
        (self.latest(), report)
    }

    /// Walks the chain and reports the first inconsistency.
    ///
    /// Genesis is only checked for internal consistency and its sentinel
    /// previous hash. Every later block is checked, in order, for hash
    /// consistency, its link to the predecessor, and the difficulty target.
    pub fn validate(&self) -> Result<(), Violation> {
        let result = self.first_violation();
        match &result {
            Ok(()) => debug!(blocks = self.blocks.len(), "chain is valid"),
            Err(v) => warn!(index = v.index(), check = %v.check(), "chain is invalid: {v}"),
        }
        result
    }

    fn first_violation(&self) -> Result<(), Violation> {
        let Some(genesis) = self.blocks.first() else {
            return Ok(());
        };
        let computed = genesis.compute_hash();
        if genesis.hash != computed || genesis.previous_hash != GENESIS_PREVIOUS_HASH {
            return Err(Violation::Genesis {
                stored: genesis.hash,
                computed,
            });
        }

        for (i, pair) in self.blocks.windows(2).enumerate() {
            let (previous, current) = (&pair[0], &pair[1]);
            let index = i + 1;

            let computed = current.compute_hash();
            if current.hash != computed {
                return Err(Violation::HashMismatch {
                    index,
                    stored: current.hash,
                    computed,
                });
            }
            if current.previous_hash != previous.hash {
                return Err(Violation::BrokenLink {
                    index,
                    expected: previous.hash,
                    found: current.previous_hash,
                });
            }
            if !meets_difficulty(&current.hash, self.difficulty) {
                return Err(Violation::InsufficientWork {
                    index,
                    hash: current.hash,
                    difficulty: self.difficulty,
                });
            }
        }
        Ok(())
    }

    pub fn is_chain_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Direct access for tampering demonstrations. Any change made here is
    /// what [`Chain::validate`] is meant to catch.
    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn latest(&self) -> &Block {
        // `blocks` starts with genesis and only ever grows.
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: a chain is created with its genesis block and never shrinks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn strategy(&self) -> MiningStrategy {
        self.strategy
    }
}
