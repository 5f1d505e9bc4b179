//! The mempool: messages submitted locally or received from peers that
//! have not yet been mined into a block.

use std::collections::HashSet;

use crate::types::Envelope;

/// A deduplicated pool of pending envelopes, keyed by envelope id.
#[derive(Default)]
pub struct Mempool {
    envelopes: HashSet<Envelope>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `envelope`, returning `true` if it was not already
    /// present.
    pub fn insert(&mut self, envelope: Envelope) -> bool {
        self.envelopes.insert(envelope)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.envelopes.iter().any(|e| e.id() == id)
    }

    /// Removes and returns one envelope, arbitrarily chosen, or `None`
    /// if the pool is empty.
    pub fn take_one(&mut self) -> Option<Envelope> {
        let candidate = self.envelopes.iter().next()?.clone();
        self.envelopes.remove(&candidate);
        Some(candidate)
    }

    /// Puts `envelope` back, e.g. after a mined block built from it
    /// failed to append because a longer chain was adopted in the
    /// meantime.
    pub fn requeue(&mut self, envelope: Envelope) {
        self.envelopes.insert(envelope);
    }

    pub fn snapshot(&self) -> Vec<Envelope> {
        self.envelopes.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.envelopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }

    /// Re-inserts every envelope carried by blocks that are no longer
    /// on the active chain after a reorg, so messages dropped by a
    /// shorter fork aren't silently lost. The replaced blocks' mempool
    /// entries are replayed here; the genesis block is never passed in.
    pub fn replay(&mut self, orphaned: impl IntoIterator<Item = Envelope>) {
        for envelope in orphaned {
            self.envelopes.insert(envelope);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_deduplicates_by_id() {
        let mut pool = Mempool::new();
        let e = Envelope::from_parts("id-1", "hello");
        assert!(pool.insert(e.clone()));
        assert!(!pool.insert(e));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn take_one_removes_the_envelope() {
        let mut pool = Mempool::new();
        pool.insert(Envelope::from_parts("id-1", "hello"));
        let taken = pool.take_one().unwrap();
        assert_eq!(taken.id(), "id-1");
        assert!(pool.is_empty());
    }

    #[test]
    fn replay_restores_orphaned_envelopes() {
        let mut pool = Mempool::new();
        pool.replay(vec![Envelope::from_parts("id-1", "hello")]);
        assert!(pool.contains("id-1"));
    }
}
