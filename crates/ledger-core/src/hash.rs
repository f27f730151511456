use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::{constants::TIMESTAMP_FORMAT, Block, Transaction};

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Canonical encoding of a block: compact JSON with keys in lexicographic
/// order at every level. Independent of the serde wire format, so renaming or
/// reordering struct fields never changes a block's hash. Amounts keep their
/// JSON number rendering, so `10` and `10.0` hash differently.
pub fn canonical_bytes(block: &Block) -> Vec<u8> {
    let transactions: Vec<Value> = block.transactions.iter().map(canonical_tx).collect();
    // Keys are listed already sorted; serde_json's default map sorts them too.
    let value = json!({
        "index": block.index,
        "previous_hash": block.previous_hash,
        "proof": block.proof,
        "timestamp": block.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        "transactions": transactions,
    });
    value.to_string().into_bytes()
}

fn canonical_tx(tx: &Transaction) -> Value {
    json!({
        "amount": tx.amount,
        "receiver": tx.receiver,
        "sender": tx.sender,
    })
}

pub fn hash_block(block: &Block) -> String {
    sha256_hex(&canonical_bytes(block))
}
