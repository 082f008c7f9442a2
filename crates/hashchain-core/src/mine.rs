use crate::{
    pow::{self, meets_difficulty, MiningReport},
    Block,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Instant,
};
use tracing::info;

/// How `Chain::add_block` searches the nonce space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MiningStrategy {
    #[default]
    Sequential,
    Parallel,
}

impl MiningStrategy {
    pub fn mine(self, block: &mut Block, difficulty: u32) -> MiningReport {
        let report = match self {
            MiningStrategy::Sequential => pow::mine(block, difficulty),
            MiningStrategy::Parallel => mine_block_parallel(block, difficulty),
        };
        info!(
            "Mined block {} with nonce {} after {} attempts: {}",
            block.index,
            report.nonce,
            report.attempts,
            block.hash_hex()
        );
        report
    }
}

/// Mines a block by searching nonces in parallel, from the block's current
/// nonce upward, until its hex hash has at least `difficulty` leading zeros.
/// Whichever worker finds a nonce first wins; the block ends up holding that
/// nonce and its matching hash.
///
/// `attempts` in the report counts every hash evaluated by every worker.
pub fn mine_block_parallel(block: &mut Block, difficulty: u32) -> MiningReport {
    let started = Instant::now();
    let start = block.nonce;
    let attempts = AtomicU64::new(0);

    // The block is only read inside the search; the winner is written back after.
    let template: &Block = &*block;
    let try_nonce = |nonce: &u64| {
        attempts.fetch_add(1, Ordering::Relaxed);
        meets_difficulty(&template.hash_with_nonce(*nonce), difficulty)
    };
    let found = (start..=u64::MAX)
        .into_par_iter()
        .find_any(try_nonce)
        .or_else(|| {
            // Wrap around like the sequential miner.
            (0..start).into_par_iter().find_any(try_nonce)
        });

    // Practically unreachable: no nonce in the whole space met the target.
    let Some(nonce) = found else {
        return pow::mine(block, difficulty);
    };

    block.nonce = nonce;
    block.hash = block.compute_hash();

    MiningReport {
        nonce,
        attempts: attempts.into_inner(),
        elapsed: started.elapsed(),
    }
}
