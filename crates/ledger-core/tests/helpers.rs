use ledger_core::{Chain, ChainConfig, Transaction};

pub fn forged_transactions() -> Vec<Transaction> {
    vec![Transaction {
        sender: "Alice".to_string(),
        recipient: "Hacker".to_string(),
        amount: 1000,
        timestamp: 1_234_567_890,
    }]
}

/// Chain at `difficulty` with `rounds` mined blocks after genesis, two
/// transfers each.
pub fn build_chain(difficulty: u32, rounds: usize) -> Chain {
    let mut chain = Chain::new(difficulty).expect("Failed to create chain");
    for round in 0..rounds {
        chain.add_transaction("Alice", "Bob", 10 + round as u64);
        chain.add_transaction("Bob", "Charlie", 5 + round as u64);
        chain.mine_pending("Miner1").expect("Failed to mine block");
    }
    chain
}

pub fn bounded_chain(difficulty: u32, max_nonce: u64) -> Chain {
    Chain::with_config(ChainConfig {
        difficulty,
        max_nonce: Some(max_nonce),
        ..ChainConfig::default()
    })
    .expect("Failed to create chain")
}
