use crate::{constants::MAX_DIFFICULTY, to_hex, Block, Hash, LedgerError, Result};
use tracing::{debug, info};

/// Bounds on the nonce search. The default policy never gives up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MiningPolicy {
    /// Highest nonce that will be tried, inclusive.
    pub max_nonce: Option<u64>,
}

impl MiningPolicy {
    pub fn unbounded() -> Self {
        Self { max_nonce: None }
    }

    pub fn up_to(max_nonce: u64) -> Self {
        Self {
            max_nonce: Some(max_nonce),
        }
    }
}

/// Number of leading `'0'` characters in the hex rendering of `hash`.
pub fn count_leading_zero_nibbles(hash: &Hash) -> u32 {
    let mut total = 0u32;
    for b in hash {
        if *b == 0 {
            total += 2;
        } else {
            if *b >> 4 == 0 {
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

/// Mine the block by incrementing the nonce until its hash starts with
/// `difficulty` hex zeros. Never returns for a difficulty above 64.
pub fn mine_block(block: &mut Block, difficulty: u32) {
    while !meets_difficulty(block.hash(), difficulty) {
        block.advance_nonce();
    }
    info!(
        "Mined block {} with nonce {} and hash {}",
        block.index(),
        block.nonce(),
        to_hex(block.hash())
    );
}

/// Same search as [`mine_block`], but stops once `policy.max_nonce` has been
/// tried. On failure the block keeps the last nonce tried.
pub fn mine_block_bounded(block: &mut Block, difficulty: u32, policy: MiningPolicy) -> Result<()> {
    if difficulty > MAX_DIFFICULTY {
        return Err(LedgerError::DifficultyOutOfRange(difficulty));
    }
    let Some(max_nonce) = policy.max_nonce else {
        mine_block(block, difficulty);
        return Ok(());
    };

    while !meets_difficulty(block.hash(), difficulty) {
        if block.nonce() >= max_nonce {
            debug!(index = block.index(), max_nonce, "nonce search exhausted");
            return Err(LedgerError::NonceSpaceExhausted {
                index: block.index(),
                max_nonce,
            });
        }
        block.advance_nonce();
    }
    info!(
        "Mined block {} with nonce {} and hash {}",
        block.index(),
        block.nonce(),
        to_hex(block.hash())
    );
    Ok(())
}
