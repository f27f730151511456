use std::time::Duration;

use thiserror::Error;

/// Failures of the ledger's own operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The chain has no blocks. Genesis is seeded on construction, so hitting
    /// this means an invariant was broken.
    #[error("chain has no blocks")]
    EmptyChain,

    #[error("block index {0} has no successor")]
    IndexOverflow(u64),

    #[error("malformed transaction payload: {0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Pow(#[from] PowError),

    #[error("mining task failed: {0}")]
    MiningTask(String),
}

/// First reason a chain fails validation. `position` is the 0-based slot in
/// the candidate chain, not the block's own `index` field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("block at position {position} has index {found}, expected {expected}")]
    IndexMismatch {
        position: usize,
        expected: u64,
        found: u64,
    },

    #[error("block at position {position} does not reference the hash of its predecessor")]
    BrokenLink { position: usize },

    #[error("block at position {position} carries proof {proof} which does not solve the puzzle for {previous_proof}")]
    InvalidProof {
        position: usize,
        previous_proof: i64,
        proof: i64,
    },
}

#[derive(Debug, Error)]
pub enum PowError {
    #[error("no proof found for previous proof {previous_proof}")]
    Exhausted { previous_proof: i64 },

    #[error("difficulty {difficulty} exceeds the digest length of {max} hex characters")]
    DifficultyOutOfRange { difficulty: usize, max: usize },
}

/// Why a peer was skipped during reconciliation.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("peer {peer} is unavailable: {reason}")]
    Unavailable { peer: String, reason: String },

    #[error("peer {peer} answered with status {status}")]
    Status { peer: String, status: u16 },

    #[error("peer {peer} sent a malformed chain: {reason}")]
    MalformedPayload { peer: String, reason: String },

    #[error("peer {peer} did not answer within {timeout:?}")]
    Timeout { peer: String, timeout: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid peer address {address:?}: {reason}")]
pub struct PeerAddrError {
    pub address: String,
    pub reason: String,
}
