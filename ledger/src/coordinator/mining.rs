//! The cooperative proof-of-work search.
//!
//! A single search runs across many calls into [`MiningAttempt::step`]
//! rather than one long blocking loop, so the coordinator's event loop
//! can interleave gossip, consensus, diffusion, and inbox handling with
//! mining instead of starving them for the minutes a high difficulty
//! search can take.

use chrono::Utc;

use crate::config::MINING_YIELD_INTERVAL;
use crate::types::{Block, Envelope, ProofValue};
use crate::validator;

/// An in-progress proof-of-work search for one envelope, anchored to
/// the chain tip as it stood when the search began.
pub struct MiningAttempt {
    envelope: Envelope,
    base_index: u64,
    base_previous_hash: String,
    last_proof: ProofValue,
    difficulty: u32,
    next_candidate: u64,
}

pub enum StepOutcome {
    /// No proof found yet; keep calling `step`.
    InProgress,
    /// A valid proof was found; here is the finished block.
    Found(Block),
}

impl MiningAttempt {
    pub fn start(envelope: Envelope, tip: &Block, difficulty: u32) -> Self {
        Self {
            envelope,
            base_index: tip.index,
            base_previous_hash: validator::hash(tip),
            last_proof: tip.proof,
            difficulty,
            next_candidate: 0,
        }
    }

    /// Tries up to `MINING_YIELD_INTERVAL` candidate proofs, then
    /// returns control to the caller. The caller is responsible for
    /// yielding to the async runtime between calls.
    pub fn step(&mut self) -> StepOutcome {
        let end = self.next_candidate + MINING_YIELD_INTERVAL;
        while self.next_candidate < end {
            let candidate = ProofValue::Value(self.next_candidate);
            self.next_candidate += 1;

            match validator::is_proof_of_work_valid(&self.last_proof, &candidate, self.difficulty) {
                Ok(true) => {
                    let block = Block {
                        index: self.base_index + 1,
                        timestamp: Utc::now(),
                        data: self.envelope.clone(),
                        proof: candidate,
                        previous_hash: self.base_previous_hash.clone(),
                    };
                    return StepOutcome::Found(block);
                }
                Ok(false) => continue,
                Err(_) => unreachable!("difficulty is validated at node construction"),
            }
        }
        StepOutcome::InProgress
    }

    /// The envelope being mined, e.g. to requeue it into the mempool if
    /// the attempt is abandoned.
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}
