pub mod chain;
pub mod constants;
pub mod error;
pub mod mine;
pub mod validate;

pub use chain::{Chain, ChainConfig};
pub use error::{LedgerError, Result};
pub use mine::{meets_difficulty, mine_block, mine_block_bounded, MiningPolicy};
pub use validate::{ChainViolation, ViolationKind};

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub type Hash = [u8; 32];

/// Parent digest carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: Hash = [0u8; 32];

/// Seconds since the Unix epoch, or 0 if the clock is before it.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub fn to_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// ctime-style rendering of a Unix timestamp in UTC, or the raw seconds when
/// the value is out of range.
pub fn format_timestamp(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .map(|dt| dt.format("%a %b %e %H:%M:%S %Y").to_string())
        .unwrap_or_else(|| secs.to_string())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
    pub timestamp: u64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: u64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            timestamp: unix_now(),
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {}", self.sender, self.recipient, self.amount)
    }
}

/// SHA-256 over the canonical JSON form of a block's identity fields.
///
/// `serde_json::Value` objects keep their keys sorted, so the preimage never
/// depends on struct field order.
pub fn block_digest(
    index: u64,
    timestamp: u64,
    transactions: &[Transaction],
    previous_hash: &Hash,
    nonce: u64,
) -> Hash {
    let preimage = json!({
        "index": index,
        "timestamp": timestamp,
        "transactions": transactions,
        "previous_hash": to_hex(previous_hash),
        "nonce": nonce,
    });
    let mut hasher = Sha256::new();
    hasher.update(preimage.to_string().as_bytes());
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    index: u64,
    timestamp: u64,
    transactions: Vec<Transaction>,
    #[serde(with = "hex_hash")]
    previous_hash: Hash,
    nonce: u64,
    #[serde(with = "hex_hash")]
    hash: Hash,
}

impl Block {
    pub fn new(
        index: u64,
        timestamp: u64,
        transactions: Vec<Transaction>,
        previous_hash: Hash,
    ) -> Self {
        Self::with_nonce(index, timestamp, transactions, previous_hash, 0)
    }

    pub fn with_nonce(
        index: u64,
        timestamp: u64,
        transactions: Vec<Transaction>,
        previous_hash: Hash,
        nonce: u64,
    ) -> Self {
        let mut block = Self {
            index,
            timestamp,
            transactions,
            previous_hash,
            nonce,
            hash: [0u8; 32],
        };
        block.recompute_hash();
        block
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn previous_hash(&self) -> &Hash {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// The stored digest. May be stale after `overwrite_transactions_unsealed`.
    pub fn hash(&self) -> &Hash {
        &self.hash
    }

    /// Digest re-derived from the current content.
    pub fn compute_hash(&self) -> Hash {
        block_digest(
            self.index,
            self.timestamp,
            &self.transactions,
            &self.previous_hash,
            self.nonce,
        )
    }

    pub fn recompute_hash(&mut self) {
        self.hash = self.compute_hash();
    }

    /// True when the stored digest matches the content.
    pub fn is_sealed(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Replaces the transaction list and reseals the block. The proof of
    /// work is lost unless the block is mined again.
    pub fn replace_transactions(&mut self, transactions: Vec<Transaction>) {
        self.transactions = transactions;
        self.recompute_hash();
    }

    /// Overwrites the transaction list and leaves the stored digest alone.
    /// Only the tamper path goes through here.
    pub fn overwrite_transactions_unsealed(&mut self, transactions: Vec<Transaction>) {
        self.transactions = transactions;
    }

    pub(crate) fn advance_nonce(&mut self) {
        self.nonce = self.nonce.wrapping_add(1);
        self.recompute_hash();
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Block #{}", self.index)?;
        writeln!(f, "Timestamp: {}", format_timestamp(self.timestamp))?;
        writeln!(f, "Previous Hash: {}", to_hex(&self.previous_hash))?;
        writeln!(f, "Hash: {}", to_hex(&self.hash))?;
        writeln!(f, "Nonce: {}", self.nonce)?;
        writeln!(f, "Transactions:")?;
        for tx in &self.transactions {
            writeln!(f, "  {tx}")?;
        }
        Ok(())
    }
}

mod hex_hash {
    use super::Hash;
    use hex::FromHex;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(s).map_err(D::Error::custom)
    }
}
