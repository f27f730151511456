pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const POW_TARGET_DIFFICULTY: usize = 4;
pub const GENESIS_PROOF: i64 = 1;
pub const GENESIS_PREVIOUS_HASH: &str = "0";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const MINING_REWARD: i64 = 1;
pub const PEER_TIMEOUT_MS: u64 = 5_000;
pub const RECONCILE_DEADLINE_MS: u64 = 30_000;
