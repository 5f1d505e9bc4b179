//! Pure validation functions: canonical byte encoding, block hashing,
//! proof-of-work verification, and whole-chain validity.
//!
//! Nothing here touches I/O or shared state, mirroring the teacher's
//! `validation` module split between a pure `base` validator and a
//! stateful one — everything in this file is the pure half.

use sha2::{Digest, Sha256};

use crate::errors::ValidationError;
use crate::types::{Block, ProofValue};

/// Encodes a block as a length-prefixed concatenation of its six
/// fields, in field-declaration order: index, envelope id, envelope
/// text, timestamp, proof, previous hash.
///
/// This replaces the fragile "hash the Display string" approach the
/// reference implementation uses (`hashlib.sha256(str(block).encode())`),
/// where two semantically different blocks can collide if their
/// `repr()` happens to coincide, and where a stray shared-formatting bug
/// silently breaks every downstream hash. Prefixing each field with its
/// byte length makes the encoding unambiguous: no field's content can be
/// mistaken for a delimiter or for adjacent fields.
pub fn canonical_bytes(block: &Block) -> Vec<u8> {
    let mut buf = Vec::new();
    push_field(&mut buf, block.index.to_string().as_bytes());
    push_field(&mut buf, block.data.id().as_bytes());
    push_field(&mut buf, block.data.text().as_bytes());
    push_field(&mut buf, block.timestamp.to_rfc3339().as_bytes());
    push_field(&mut buf, block.proof.decimal_text().as_bytes());
    push_field(&mut buf, block.previous_hash.as_bytes());
    buf
}

fn push_field(buf: &mut Vec<u8>, field: &[u8]) {
    buf.extend_from_slice(&(field.len() as u32).to_le_bytes());
    buf.extend_from_slice(field);
}

/// SHA-256 hex digest of a block's canonical bytes.
pub fn hash(block: &Block) -> String {
    sha256_hex(&canonical_bytes(block))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Checks whether `proof` is a valid proof-of-work continuation of
/// `last_proof` at the given `difficulty`.
///
/// The guess is `"{last_proof}{proof}"` (decimal text concatenation,
/// with the genesis sentinel rendering as the literal `"None"`), hashed
/// with SHA-256 and hex-encoded; the proof is valid if that digest ends
/// in `difficulty` `'0'` characters. `difficulty` must be at least 1.
pub fn is_proof_of_work_valid(
    last_proof: &ProofValue,
    proof: &ProofValue,
    difficulty: u32,
) -> Result<bool, ValidationError> {
    if difficulty == 0 {
        return Err(ValidationError::InvalidArgument(
            "difficulty must be greater than zero".to_string(),
        ));
    }

    let guess = format!("{}{}", last_proof.decimal_text(), proof.decimal_text());
    let digest = sha256_hex(guess.as_bytes());
    let suffix = "0".repeat(difficulty as usize);
    Ok(digest.ends_with(&suffix))
}

/// Validates an entire chain: block 0 must be the fixed genesis block,
/// each subsequent block's `previous_hash` must match the hash of its
/// predecessor, its `index` must be exactly one greater, and its proof
/// must satisfy [`is_proof_of_work_valid`] against the predecessor's
/// proof.
pub fn is_chain_valid(chain: &[Block], difficulty: u32) -> bool {
    let Some(genesis) = chain.first() else {
        return false;
    };
    if genesis != &Block::genesis() {
        return false;
    }

    for window in chain.windows(2) {
        let [previous, current] = window else {
            unreachable!("windows(2) always yields pairs");
        };

        if current.index != previous.index + 1 {
            return false;
        }
        if current.previous_hash != hash(previous) {
            return false;
        }
        if current.timestamp <= previous.timestamp {
            return false;
        }
        match is_proof_of_work_valid(&previous.proof, &current.proof, difficulty) {
            Ok(true) => {}
            _ => return false,
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Envelope;

    fn child_of(previous: &Block, proof: u64) -> Block {
        Block {
            index: previous.index + 1,
            timestamp: previous.timestamp + chrono::Duration::seconds(1),
            data: Envelope::new("a message").unwrap(),
            proof: ProofValue::Value(proof),
            previous_hash: hash(previous),
        }
    }

    #[test]
    fn genesis_fixture_proofs_satisfy_difficulty_one_through_five() {
        // These are the reference implementation's own fixture values
        // for successive proof searches against the genesis proof.
        let fixtures = [(1u32, 1u64), (2, 350), (3, 3969), (4, 15558), (5, 1406000)];
        for (difficulty, proof) in fixtures {
            assert!(is_proof_of_work_valid(
                &ProofValue::Genesis,
                &ProofValue::Value(proof),
                difficulty
            )
            .unwrap());
        }
    }

    #[test]
    fn difficulty_zero_is_rejected() {
        let err =
            is_proof_of_work_valid(&ProofValue::Genesis, &ProofValue::Value(1), 0).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidArgument(_)));
    }

    #[test]
    fn single_genesis_chain_is_valid() {
        let chain = vec![Block::genesis()];
        assert!(is_chain_valid(&chain, 1));
    }

    #[test]
    fn chain_with_wrong_previous_hash_is_invalid() {
        let genesis = Block::genesis();
        let mut bad_child = child_of(&genesis, 1);
        bad_child.previous_hash = "f".repeat(64);
        let chain = vec![genesis, bad_child];
        assert!(!is_chain_valid(&chain, 1));
    }

    #[test]
    fn chain_with_non_sequential_index_is_invalid() {
        let genesis = Block::genesis();
        let mut bad_child = child_of(&genesis, 1);
        bad_child.index = 5;
        let chain = vec![genesis, bad_child];
        assert!(!is_chain_valid(&chain, 1));
    }

    #[test]
    fn chain_with_non_advancing_timestamp_is_invalid() {
        let genesis = Block::genesis();
        let mut bad_child = child_of(&genesis, 1);
        bad_child.timestamp = genesis.timestamp;
        let chain = vec![genesis, bad_child];
        assert!(!is_chain_valid(&chain, 1));
    }

    #[test]
    fn chain_not_starting_with_genesis_is_invalid() {
        let not_genesis = child_of(&Block::genesis(), 1);
        assert!(!is_chain_valid(&[not_genesis], 1));
    }
}
