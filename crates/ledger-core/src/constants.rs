pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
/// Leading hex zeros a digest can have at most.
pub const MAX_DIFFICULTY: u32 = HASH_HEX_SIZE as u32;
pub const DEFAULT_DIFFICULTY: u32 = 2;
pub const MINING_REWARD: u64 = 1;
pub const REWARD_SENDER: &str = "BLOCKCHAIN_REWARD";
