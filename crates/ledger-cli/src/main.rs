mod display;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ledger_core::{
    constants::{DEFAULT_DIFFICULTY, MINING_REWARD},
    Chain, ChainConfig, Transaction,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "Drive a minimal proof-of-work ledger from the command line")]
struct Cli {
    /// Leading hex zeros required in each block hash
    #[arg(long, global = true, default_value_t = DEFAULT_DIFFICULTY)]
    difficulty: u32,

    /// Amount paid to the miner for each block
    #[arg(long, global = true, default_value_t = MINING_REWARD)]
    reward: u64,

    /// Give up mining a block after this nonce
    #[arg(long, global = true)]
    max_nonce: Option<u64>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mine two blocks, print the chain, then tamper with a block and validate again
    Demo {
        /// Block to overwrite after the chain has been printed
        #[arg(long, default_value_t = 1)]
        tamper_index: usize,
    },
    /// Mine the given transactions and print the resulting chain
    Run {
        /// Transaction as `sender:recipient:amount`; repeatable
        #[arg(long = "tx", value_parser = parse_tx)]
        txs: Vec<TxArg>,
        /// Address receiving the mining reward
        #[arg(long, default_value = "Miner1")]
        miner: String,
        /// Number of blocks to mine; transactions go into the first one
        #[arg(long, default_value_t = 1)]
        blocks: usize,
        /// Print the chain as JSON instead of the block dump
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct TxArg {
    sender: String,
    recipient: String,
    amount: u64,
}

fn parse_tx(s: &str) -> std::result::Result<TxArg, String> {
    let parts: Vec<&str> = s.split(':').collect();
    let [sender, recipient, amount] = parts.as_slice() else {
        return Err(format!("expected sender:recipient:amount, got `{s}`"));
    };
    if sender.is_empty() || recipient.is_empty() {
        return Err(format!("sender and recipient must be non-empty in `{s}`"));
    }
    let amount = amount
        .parse::<u64>()
        .map_err(|e| format!("invalid amount `{amount}`: {e}"))?;
    Ok(TxArg {
        sender: sender.to_string(),
        recipient: recipient.to_string(),
        amount,
    })
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ChainConfig {
        difficulty: cli.difficulty,
        mining_reward: cli.reward,
        max_nonce: cli.max_nonce,
    };

    match cli.cmd {
        Command::Demo { tamper_index } => demo(config, tamper_index),
        Command::Run {
            txs,
            miner,
            blocks,
            json,
        } => run(config, txs, &miner, blocks, json),
    }
}

fn demo(config: ChainConfig, tamper_index: usize) -> Result<()> {
    println!("Creating a new blockchain...");
    let mut chain = Chain::with_config(config).context("creating chain")?;

    println!("\nAdding transactions...");
    chain.add_transaction("Alice", "Bob", 50);
    chain.add_transaction("Bob", "Charlie", 25);

    println!("\nMining block...");
    chain.mine_pending("Miner1")?;

    println!("\nAdding more transactions...");
    chain.add_transaction("Charlie", "Dave", 10);
    chain.add_transaction("Alice", "Eve", 30);

    println!("\nMining block...");
    chain.mine_pending("Miner1")?;

    println!("\nBlockchain:");
    display::print_chain(&chain);

    println!("\nValidating blockchain...");
    println!("Is blockchain valid? {}", chain.is_valid());

    println!("\nTampering with the blockchain...");
    let forged = vec![Transaction {
        sender: "Alice".to_string(),
        recipient: "Hacker".to_string(),
        amount: 1000,
        timestamp: 1_234_567_890,
    }];
    chain.tamper_with_block(tamper_index, forged)?;

    println!("\nValidating blockchain after tampering...");
    match chain.validate() {
        Ok(()) => println!("Is blockchain valid? true"),
        Err(violation) => {
            println!("Is blockchain valid? false");
            println!("First violation: {violation}");
        }
    }

    println!("\nBlockchain after tampering:");
    display::print_chain(&chain);
    Ok(())
}

fn run(config: ChainConfig, txs: Vec<TxArg>, miner: &str, blocks: usize, json: bool) -> Result<()> {
    if blocks == 0 && !txs.is_empty() {
        bail!("{} transaction(s) given but --blocks is 0", txs.len());
    }
    let mut chain = Chain::with_config(config).context("creating chain")?;
    for tx in &txs {
        chain.add_transaction(&tx.sender, &tx.recipient, tx.amount);
    }
    for _ in 0..blocks {
        chain.mine_pending(miner)?;
    }
    info!(blocks = chain.len(), "chain built");

    if json {
        println!("{}", serde_json::to_string_pretty(&chain)?);
    } else {
        display::print_chain(&chain);
        println!("\nIs blockchain valid? {}", chain.is_valid());
    }
    Ok(())
}
