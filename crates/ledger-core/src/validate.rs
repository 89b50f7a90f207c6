//! Read-only integrity audit over a sequence of blocks.
//!
//! Every call re-derives every digest from block content; nothing is cached
//! between calls.

use crate::{mine::meets_difficulty, Block};
use std::fmt;
use thiserror::Error;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    /// Stored hash differs from the hash of the block's content.
    DigestMismatch,
    /// `previous_hash` does not equal the parent's stored hash.
    BrokenLink,
    /// Stored hash does not carry the required leading zeros.
    InsufficientWork,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ViolationKind::DigestMismatch => "invalid hash",
            ViolationKind::BrokenLink => "invalid previous hash",
            ViolationKind::InsufficientWork => "insufficient proof of work",
        };
        f.write_str(text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("{kind} in block #{index}")]
pub struct ChainViolation {
    pub index: usize,
    pub kind: ViolationKind,
}

/// Returns the first violation found, scanning from genesis forward.
///
/// Genesis is checked for digest integrity and work; linkage is checked for
/// every block after it.
pub fn validate_chain(blocks: &[Block], difficulty: u32) -> Result<(), ChainViolation> {
    for (i, block) in blocks.iter().enumerate() {
        if *block.hash() != block.compute_hash() {
            return Err(violation(i, ViolationKind::DigestMismatch));
        }
        if i > 0 && block.previous_hash() != blocks[i - 1].hash() {
            return Err(violation(i, ViolationKind::BrokenLink));
        }
        if !meets_difficulty(block.hash(), difficulty) {
            return Err(violation(i, ViolationKind::InsufficientWork));
        }
    }
    Ok(())
}

pub fn is_chain_valid(blocks: &[Block], difficulty: u32) -> bool {
    validate_chain(blocks, difficulty).is_ok()
}

fn violation(index: usize, kind: ViolationKind) -> ChainViolation {
    let violation = ChainViolation { index, kind };
    warn!("{violation}");
    violation
}
