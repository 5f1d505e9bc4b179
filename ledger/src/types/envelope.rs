//! The message envelope: a user-supplied text with a generated opaque
//! identifier.

use std::hash::{Hash, Hasher};

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// A user-submitted message, paired with an opaque identifier.
///
/// Equality and hashing are defined on `id` alone (see the design note on
/// this in `DESIGN.md`): two envelopes with the same `id` are considered
/// the same message even if their `text` differs. This mirrors the
/// reference implementation's `Data` class, whose `__eq__`/`__hash__`
/// both key off `self.id`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    id: String,
    text: String,
}

impl Envelope {
    /// Wraps `text` in a freshly generated envelope.
    ///
    /// `id` is a 128-bit random value rendered as 32 lowercase hex
    /// characters, unique with overwhelming probability.
    pub fn new(text: impl Into<String>) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.is_empty() {
            return Err(ValidationError::InvalidArgument(
                "message text must not be empty".to_string(),
            ));
        }

        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        let id = hex::encode(bytes);

        Ok(Self { id, text })
    }

    /// Reconstructs an envelope from an already-generated id.
    ///
    /// Used for genesis data (a fixed, well-known id) and when
    /// deserializing envelopes received from peers — in both cases the
    /// id has already been assigned elsewhere.
    pub fn from_parts(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl PartialEq for Envelope {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Envelope {}

impl Hash for Envelope {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_empty_text() {
        let err = Envelope::new("").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidArgument(_)));
    }

    #[test]
    fn two_envelopes_from_same_text_have_distinct_ids() {
        let a = Envelope::new("hello").unwrap();
        let b = Envelope::new("hello").unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.text(), b.text());
    }

    #[test]
    fn id_is_32_lowercase_hex_chars() {
        let e = Envelope::new("hello").unwrap();
        assert_eq!(e.id().len(), 32);
        assert!(e.id().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn equality_and_hash_are_id_only() {
        let a = Envelope::from_parts("deadbeef", "first text");
        let b = Envelope::from_parts("deadbeef", "second text");
        assert_eq!(a, b);

        use std::collections::hash_map::DefaultHasher;
        let mut ha = DefaultHasher::new();
        let mut hb = DefaultHasher::new();
        a.hash(&mut ha);
        b.hash(&mut hb);
        assert_eq!(ha.finish(), hb.finish());
    }
}
