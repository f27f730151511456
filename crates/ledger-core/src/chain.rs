use std::mem;

use tracing::info;

use crate::{
    error::{LedgerError, ValidationError},
    pow::ProofOfWork,
    Block, ChainSnapshot, Transaction,
};

/// The block chain plus the pool of transactions waiting for the next block.
///
/// Always holds at least the genesis block. Callers that share a ledger
/// across tasks wrap it in a lock (see [`crate::LedgerNode`]); every method
/// here assumes exclusive or shared access has already been arranged.
#[derive(Clone, Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    pow: ProofOfWork,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(ProofOfWork::default())
    }
}

impl Ledger {
    pub fn new(pow: ProofOfWork) -> Self {
        Self {
            chain: vec![Block::genesis()],
            pending: Vec::new(),
            pow,
        }
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn pow(&self) -> &ProofOfWork {
        &self.pow
    }

    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot::new(self.chain.clone())
    }

    pub fn previous_block(&self) -> Result<&Block, LedgerError> {
        self.chain.last().ok_or(LedgerError::EmptyChain)
    }

    /// Queue a transaction and return the index of the block that will carry it.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<u64, LedgerError> {
        let last = self.previous_block()?.index;
        let next_index = last.checked_add(1).ok_or(LedgerError::IndexOverflow(last))?;
        self.pending.push(tx);
        Ok(next_index)
    }

    /// Seal the whole pending pool into a new block and append it.
    pub fn create_block(&mut self, proof: i64, previous_hash: String) -> &Block {
        let index = self.chain.len() as u64 + 1;
        let transactions = mem::take(&mut self.pending);
        let block = Block::new(index, proof, previous_hash, transactions);
        info!(
            index,
            proof,
            txs = block.transactions.len(),
            "appended block"
        );
        self.chain.push(block);
        &self.chain[self.chain.len() - 1]
    }

    /// Validate an arbitrary candidate chain under this ledger's puzzle.
    pub fn is_chain_valid(&self, candidate: &[Block]) -> bool {
        is_chain_valid(candidate, &self.pow)
    }

    pub fn is_valid(&self) -> bool {
        self.is_chain_valid(&self.chain)
    }

    /// Install a chain received from a peer. The pending pool is kept.
    pub(crate) fn replace_chain(&mut self, chain: Vec<Block>) {
        info!(old = self.chain.len(), new = chain.len(), "replacing local chain");
        self.chain = chain;
    }
}

/// Walk the chain pairwise, checking the 1-based index, hash linkage and
/// proof of work. The first block is trusted as-is; chains of length 0 or 1
/// are valid.
pub fn validate_chain(chain: &[Block], pow: &ProofOfWork) -> Result<(), ValidationError> {
    for (position, pair) in chain.windows(2).enumerate() {
        let (previous, current) = (&pair[0], &pair[1]);
        let position = position + 1;
        let expected = position as u64 + 1;
        if current.index != expected {
            return Err(ValidationError::IndexMismatch {
                position,
                expected,
                found: current.index,
            });
        }
        if current.previous_hash != previous.hash() {
            return Err(ValidationError::BrokenLink { position });
        }
        if !pow.verify(previous.proof, current.proof) {
            return Err(ValidationError::InvalidProof {
                position,
                previous_proof: previous.proof,
                proof: current.proof,
            });
        }
    }
    Ok(())
}

pub fn is_chain_valid(chain: &[Block], pow: &ProofOfWork) -> bool {
    validate_chain(chain, pow).is_ok()
}
