use rayon::prelude::*;
use tracing::debug;

use crate::{
    constants::{HASH_HEX_SIZE, POW_TARGET_DIFFICULTY},
    error::PowError,
    hash::sha256_hex,
};

/// The proof-of-work puzzle: find `proof` such that
/// `sha256(decimal(proof² - previous_proof²))` starts with `difficulty` zero
/// hex characters.
///
/// The squared difference is used instead of hashing the pair directly so
/// that swapping the two proofs does not produce the same digest. The search
/// is unbounded; expect about `16^difficulty` hash evaluations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: usize,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self {
            difficulty: POW_TARGET_DIFFICULTY,
        }
    }
}

impl ProofOfWork {
    pub fn new(difficulty: usize) -> Result<Self, PowError> {
        if difficulty > HASH_HEX_SIZE {
            return Err(PowError::DifficultyOutOfRange {
                difficulty,
                max: HASH_HEX_SIZE,
            });
        }
        Ok(Self { difficulty })
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn verify(&self, previous_proof: i64, proof: i64) -> bool {
        count_leading_zero_hex(&puzzle_digest(previous_proof, proof)) >= self.difficulty
    }

    /// Smallest positive proof solving the puzzle for `previous_proof`.
    pub fn solve(&self, previous_proof: i64) -> Result<i64, PowError> {
        let proof = (1..=i64::MAX)
            .find(|candidate| self.verify(previous_proof, *candidate))
            .ok_or(PowError::Exhausted { previous_proof })?;
        debug!(previous_proof, proof, "solved proof of work");
        Ok(proof)
    }

    /// Same answer as [`ProofOfWork::solve`], searched on the rayon pool.
    /// `find_first` keeps the result deterministic regardless of scheduling.
    pub fn solve_parallel(&self, previous_proof: i64) -> Result<i64, PowError> {
        let proof = (1..i64::MAX)
            .into_par_iter()
            .find_first(|candidate| self.verify(previous_proof, *candidate))
            .ok_or(PowError::Exhausted { previous_proof })?;
        debug!(previous_proof, proof, "solved proof of work in parallel");
        Ok(proof)
    }
}

/// Digest checked by the puzzle. Squares are taken in 128 bits, which holds
/// any pair of 64-bit proofs without overflow.
pub fn puzzle_digest(previous_proof: i64, proof: i64) -> String {
    let new = i128::from(proof);
    let old = i128::from(previous_proof);
    sha256_hex((new * new - old * old).to_string().as_bytes())
}

pub fn count_leading_zero_hex(digest: &str) -> usize {
    digest.chars().take_while(|c| *c == '0').count()
}
