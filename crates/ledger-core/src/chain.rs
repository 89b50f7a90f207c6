use crate::constants::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY, MINING_REWARD, REWARD_SENDER};
use crate::mine::{mine_block_bounded, MiningPolicy};
use crate::validate::{validate_chain, ChainViolation};
use crate::{unix_now, Block, LedgerError, Result, Transaction, GENESIS_PREVIOUS_HASH};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ChainConfig {
    /// Leading hex zeros required in every block hash. 0 disables the puzzle.
    pub difficulty: u32,
    /// Amount paid to the reward address for each mined block.
    pub mining_reward: u64,
    /// Highest nonce tried per block; `None` searches until a solution is found.
    pub max_nonce: Option<u64>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: MINING_REWARD,
            max_nonce: None,
        }
    }
}

impl ChainConfig {
    fn policy(&self) -> MiningPolicy {
        MiningPolicy {
            max_nonce: self.max_nonce,
        }
    }
}

/// In-memory chain with its pending-transaction buffer.
#[derive(Clone, Debug, Serialize)]
pub struct Chain {
    blocks: Vec<Block>,
    pending: Vec<Transaction>,
    config: ChainConfig,
}

impl Chain {
    /// Build a chain with the default reward and an unbounded miner, and mine
    /// its genesis block.
    pub fn new(difficulty: u32) -> Result<Self> {
        Self::with_config(ChainConfig {
            difficulty,
            ..ChainConfig::default()
        })
    }

    pub fn with_config(config: ChainConfig) -> Result<Self> {
        if config.difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::DifficultyOutOfRange(config.difficulty));
        }
        let mut chain = Self {
            blocks: Vec::new(),
            pending: Vec::new(),
            config,
        };
        chain.create_genesis()?;
        Ok(chain)
    }

    fn create_genesis(&mut self) -> Result<()> {
        let mut genesis = Block::new(0, unix_now(), Vec::new(), GENESIS_PREVIOUS_HASH);
        mine_block_bounded(&mut genesis, self.config.difficulty, self.config.policy())?;
        self.blocks.push(genesis);
        Ok(())
    }

    pub fn latest(&self) -> Result<&Block> {
        self.blocks.last().ok_or(LedgerError::EmptyChain)
    }

    pub fn add_transaction(&mut self, sender: &str, recipient: &str, amount: u64) {
        let tx = Transaction::new(sender, recipient, amount);
        debug!(%tx, pending = self.pending.len() + 1, "transaction queued");
        self.pending.push(tx);
    }

    /// Seal every pending transaction plus a reward for `reward_address` into
    /// a new block and append it.
    ///
    /// If the miner gives up, the chain and the pending buffer are left as
    /// they were before the call.
    pub fn mine_pending(&mut self, reward_address: &str) -> Result<&Block> {
        let previous_hash = *self.latest()?.hash();
        let mut transactions = self.pending.clone();
        transactions.push(Transaction::new(
            REWARD_SENDER,
            reward_address,
            self.config.mining_reward,
        ));

        let index = self.blocks.len() as u64;
        let mut block = Block::new(index, unix_now(), transactions, previous_hash);
        mine_block_bounded(&mut block, self.config.difficulty, self.config.policy())?;

        info!(
            index,
            txs = block.transactions().len(),
            reward_address,
            "block appended"
        );
        self.blocks.push(block);
        self.pending.clear();
        self.latest()
    }

    pub fn validate(&self) -> std::result::Result<(), ChainViolation> {
        validate_chain(&self.blocks, self.config.difficulty)
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Overwrite a block's transactions without resealing it. Demonstration
    /// only: the chain is expected to fail validation afterwards.
    pub fn tamper_with_block(&mut self, index: usize, transactions: Vec<Transaction>) -> Result<()> {
        let len = self.blocks.len();
        let block = self
            .blocks
            .get_mut(index)
            .ok_or(LedgerError::TamperOutOfRange { index, len })?;
        block.overwrite_transactions_unsealed(transactions);
        warn!("Block #{index} has been tampered with!");
        Ok(())
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn difficulty(&self) -> u32 {
        self.config.difficulty
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{to_hex, ViolationKind};

    #[test]
    fn genesis_block_example() {
        let chain = Chain::new(2).unwrap();
        assert_eq!(chain.len(), 1);
        let genesis = chain.latest().unwrap();
        assert_eq!(genesis.index(), 0);
        assert_eq!(*genesis.previous_hash(), GENESIS_PREVIOUS_HASH);
        assert!(genesis.transactions().is_empty());
        assert!(to_hex(genesis.hash()).starts_with("00"));
        assert!(chain.pending().is_empty());
    }

    #[test]
    fn zero_difficulty_skips_the_search() {
        let chain = Chain::new(0).unwrap();
        assert_eq!(chain.latest().unwrap().nonce(), 0);
        assert!(chain.is_valid());
    }

    #[test]
    fn rejects_difficulty_beyond_hash_width() {
        let err = Chain::new(MAX_DIFFICULTY + 1).unwrap_err();
        assert_eq!(err, LedgerError::DifficultyOutOfRange(MAX_DIFFICULTY + 1));
    }

    #[test]
    fn add_transaction_only_touches_pending() {
        let mut chain = Chain::new(1).unwrap();
        chain.add_transaction("Alice", "Bob", 50);
        chain.add_transaction("Alice", "Bob", 50);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.pending().len(), 2);
        assert_eq!(chain.pending()[0].sender, "Alice");
        assert_eq!(chain.pending()[0].recipient, "Bob");
        assert_eq!(chain.pending()[0].amount, 50);
    }

    #[test]
    fn mine_pending_moves_buffer_into_block() {
        let mut chain = Chain::new(1).unwrap();
        chain.add_transaction("Alice", "Bob", 50);
        chain.add_transaction("Bob", "Charlie", 25);
        let parent = *chain.latest().unwrap().hash();

        let block = chain.mine_pending("Miner1").unwrap();
        assert_eq!(block.index(), 1);
        assert_eq!(*block.previous_hash(), parent);
        let txs = block.transactions();
        assert_eq!(txs.len(), 3);
        assert_eq!(txs[0].sender, "Alice");
        assert_eq!(txs[1].sender, "Bob");
        assert_eq!(txs[2].sender, REWARD_SENDER);
        assert_eq!(txs[2].recipient, "Miner1");
        assert_eq!(txs[2].amount, MINING_REWARD);

        assert!(chain.pending().is_empty());
        assert_eq!(chain.len(), 2);
        assert!(chain.is_valid());
    }

    #[test]
    fn mine_pending_with_empty_buffer_still_pays_reward() {
        let mut chain = Chain::new(1).unwrap();
        let block = chain.mine_pending("Miner1").unwrap();
        assert_eq!(block.transactions().len(), 1);
        assert_eq!(block.transactions()[0].sender, REWARD_SENDER);
    }

    #[test]
    fn configured_reward_is_paid() {
        let mut chain = Chain::with_config(ChainConfig {
            difficulty: 1,
            mining_reward: 12,
            max_nonce: None,
        })
        .unwrap();
        let block = chain.mine_pending("Miner1").unwrap();
        assert_eq!(block.transactions()[0].amount, 12);
    }

    #[test]
    fn exhausted_miner_leaves_state_untouched() {
        // genesis mines at 0; the next block needs 64 zeros within 10 nonces
        let mut chain = Chain::with_config(ChainConfig {
            difficulty: 0,
            mining_reward: 1,
            max_nonce: Some(10),
        })
        .unwrap();
        chain.config.difficulty = 64;
        chain.add_transaction("Alice", "Bob", 5);

        let err = chain.mine_pending("Miner1").unwrap_err();
        assert_eq!(
            err,
            LedgerError::NonceSpaceExhausted {
                index: 1,
                max_nonce: 10
            }
        );
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.pending().len(), 1);
        assert_eq!(chain.pending()[0].recipient, "Bob");
    }

    #[test]
    fn bounded_genesis_failure_is_reported() {
        let err = Chain::with_config(ChainConfig {
            difficulty: 64,
            mining_reward: 1,
            max_nonce: Some(5),
        })
        .unwrap_err();
        assert!(matches!(err, LedgerError::NonceSpaceExhausted { index: 0, .. }));
    }

    #[test]
    fn latest_on_empty_chain_fails() {
        let chain = Chain {
            blocks: Vec::new(),
            pending: Vec::new(),
            config: ChainConfig::default(),
        };
        assert!(chain.is_empty());
        assert_eq!(chain.latest().unwrap_err(), LedgerError::EmptyChain);
    }

    #[test]
    fn tamper_invalidates_chain() {
        let mut chain = Chain::new(1).unwrap();
        chain.add_transaction("Alice", "Bob", 50);
        chain.mine_pending("Miner1").unwrap();
        assert!(chain.is_valid());

        let forged = vec![Transaction {
            sender: "Alice".to_string(),
            recipient: "Hacker".to_string(),
            amount: 1000,
            timestamp: 1_234_567_890,
        }];
        chain.tamper_with_block(1, forged.clone()).unwrap();
        assert_eq!(chain.get(1).unwrap().transactions(), forged.as_slice());
        assert!(!chain.is_valid());
        assert_eq!(
            chain.validate().unwrap_err().kind,
            ViolationKind::DigestMismatch
        );
    }

    #[test]
    fn tamper_out_of_range_is_an_error() {
        let mut chain = Chain::new(1).unwrap();
        let err = chain.tamper_with_block(5, vec![]).unwrap_err();
        assert_eq!(err, LedgerError::TamperOutOfRange { index: 5, len: 1 });
        assert!(chain.is_valid());
    }

    #[test]
    fn chain_serializes_blocks_and_pending() {
        let mut chain = Chain::new(1).unwrap();
        chain.add_transaction("Alice", "Bob", 50);
        let value = serde_json::to_value(&chain).unwrap();
        assert_eq!(value["blocks"].as_array().unwrap().len(), 1);
        assert_eq!(value["pending"][0]["recipient"], "Bob");
        assert_eq!(value["config"]["difficulty"], 1);
    }
}
