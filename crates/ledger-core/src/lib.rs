use chrono::{NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Number;

pub mod chain;
pub mod consensus;
pub mod constants;
pub mod error;
pub mod hash;
pub mod node;
pub mod peers;
pub mod pow;

pub use chain::{is_chain_valid, validate_chain, Ledger};
pub use consensus::{ChainFetcher, ReconcileConfig, ReconcileOutcome, Reconciler};
pub use error::{LedgerError, PeerAddrError, PeerError, PowError, ValidationError};
pub use node::{LedgerNode, MiningReward, NodeConfig};
pub use peers::PeerRegistry;
pub use pow::ProofOfWork;

use constants::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF};

/// A transfer waiting in, or sealed into, a block. `amount` is any JSON
/// number, integer or decimal, and is hashed exactly as it is rendered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub receiver: String,
    pub amount: Number,
}

impl Transaction {
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: impl Into<Number>,
    ) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            amount: amount.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub proof: i64,
    pub previous_hash: String,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Stamp a new block with the current UTC time, truncated to whole seconds
    /// so the in-memory value survives a trip through the wire format intact.
    pub fn new(
        index: u64,
        proof: i64,
        previous_hash: String,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            index,
            timestamp: Utc::now().naive_utc().trunc_subsecs(0),
            proof,
            previous_hash,
            transactions,
        }
    }

    pub fn genesis() -> Self {
        Self::new(1, GENESIS_PROOF, GENESIS_PREVIOUS_HASH.to_string(), Vec::new())
    }

    pub fn hash(&self) -> String {
        hash::hash_block(self)
    }
}

/// Response shape of a node's "get chain" query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
    pub length: usize,
}

impl ChainSnapshot {
    pub fn new(chain: Vec<Block>) -> Self {
        let length = chain.len();
        Self { chain, length }
    }
}

mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::constants::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
