//! The proof-of-work value attached to a block.

use serde::{Deserialize, Serialize};

/// A block's proof-of-work value.
///
/// The genesis block carries no real proof; the reference implementation
/// represents this by leaving `proof` as Python's `None` and feeding the
/// literal text `"None"` into the hash of the first real block's proof
/// search. To reproduce that behaviour (and the fixture hash values that
/// depend on it) bit-for-bit, [`ProofValue::decimal_text`] renders
/// `Genesis` as the literal string `"None"` rather than as a number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofValue {
    Genesis,
    Value(u64),
}

impl ProofValue {
    /// Renders this proof the way it is fed into the proof-of-work hash:
    /// `Genesis` as the literal text `"None"`, everything else as plain
    /// decimal digits.
    pub fn decimal_text(&self) -> String {
        match self {
            ProofValue::Genesis => "None".to_string(),
            ProofValue::Value(v) => v.to_string(),
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ProofValue::Genesis => None,
            ProofValue::Value(v) => Some(*v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_renders_as_none_literal() {
        assert_eq!(ProofValue::Genesis.decimal_text(), "None");
    }

    #[test]
    fn value_renders_as_decimal() {
        assert_eq!(ProofValue::Value(350).decimal_text(), "350");
    }
}
