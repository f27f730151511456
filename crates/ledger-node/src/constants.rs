pub const DEFAULT_LISTEN: &str = "127.0.0.1:5000";
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 0;
pub const CHAIN_PATH: &str = "/get_chain";
