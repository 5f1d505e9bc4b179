//! The block type and the fixed genesis block every honest node starts
//! from.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::envelope::Envelope;
use super::proof::ProofValue;

/// Hex id of the genesis envelope. Fixed and well-known so that every
/// node constructs a byte-identical genesis block; never generated at
/// runtime.
pub const GENESIS_ENVELOPE_ID: &str = "00000000000000000000000000000000";

/// Text carried by the genesis envelope, taken from the reference
/// implementation's constant of the same role.
pub const GENESIS_ENVELOPE_TEXT: &str =
    "This is the workload of the very first Block in this chain!";

/// `previous_hash` carried by the genesis block: 64 `'0'` characters,
/// the same width as a real SHA-256 hex digest, standing in for "no
/// parent".
pub const GENESIS_PREVIOUS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// A single entry in the ledger.
///
/// `index` is the block's position in the chain (genesis is `0`).
/// `previous_hash` is the SHA-256 hex digest of the previous block's
/// canonical bytes. `proof` is the value that, combined with the
/// previous block's proof, satisfies the difficulty check computed by
/// [`crate::validator::is_proof_of_work_valid`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub data: Envelope,
    pub proof: ProofValue,
    pub previous_hash: String,
}

impl Block {
    /// Builds the fixed genesis block. Identical on every node: same
    /// index, timestamp, envelope, proof sentinel, and previous hash.
    pub fn genesis() -> Self {
        let timestamp = Utc
            .with_ymd_and_hms(2023, 1, 1, 0, 0, 0)
            .single()
            .expect("2023-01-01T00:00:00Z is a valid instant");

        Block {
            index: 0,
            timestamp,
            data: Envelope::from_parts(GENESIS_ENVELOPE_ID, GENESIS_ENVELOPE_TEXT),
            proof: ProofValue::Genesis,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_is_deterministic() {
        let a = Block::genesis();
        let b = Block::genesis();
        assert_eq!(a, b);
        assert_eq!(a.data.id(), GENESIS_ENVELOPE_ID);
        assert_eq!(a.proof, ProofValue::Genesis);
    }

    #[test]
    fn genesis_previous_hash_is_64_chars() {
        assert_eq!(GENESIS_PREVIOUS_HASH.len(), 64);
    }
}
