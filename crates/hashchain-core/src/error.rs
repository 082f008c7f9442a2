use thiserror::Error;

use crate::constants::MAX_DIFFICULTY;

/// Misuse of the chain API, rejected before any mining starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("difficulty {difficulty} is out of range (maximum is {max})", max = MAX_DIFFICULTY)]
    DifficultyOutOfRange { difficulty: u32 },
    #[error("a chain must contain at least the genesis block")]
    MissingGenesis,
}
