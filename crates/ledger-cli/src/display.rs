use ledger_core::{Block, Chain};

const RULE: &str = "==================================================";

pub fn print_block(block: &Block) {
    println!("\n{RULE}");
    print!("{block}");
    println!("{RULE}");
}

pub fn print_chain(chain: &Chain) {
    for block in chain.blocks() {
        print_block(block);
    }
}
