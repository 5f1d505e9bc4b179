//! Peer endpoints and the bounded, pruning peer set.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// A canonicalized `host:port` peer address.
///
/// Construction rewrites `localhost` and `0.0.0.0` to `127.0.0.1`,
/// matching the reference implementation's `encode_IP_port_properly`:
/// both are loopback-equivalent hostnames a node might report about
/// itself, and treating them as distinct from `127.0.0.1` would let the
/// same peer appear three times under three different names.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PeerEndpoint {
    host: String,
    port: u16,
}

impl PeerEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, ValidationError> {
        if port == 0 {
            return Err(ValidationError::InvalidArgument(
                "port must be between 1 and 65535".to_string(),
            ));
        }

        let host = match host.into().as_str() {
            "localhost" | "0.0.0.0" => "127.0.0.1".to_string(),
            other => other.to_string(),
        };

        Ok(Self { host, port })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for PeerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for PeerEndpoint {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s.rsplit_once(':').ok_or_else(|| {
            ValidationError::InvalidArgument(format!("peer endpoint {s:?} is missing a port"))
        })?;
        let port: u16 = port
            .parse()
            .map_err(|_| ValidationError::InvalidArgument(format!("invalid port in {s:?}")))?;
        PeerEndpoint::new(host, port)
    }
}

/// The set of peers a node currently knows about.
///
/// Bounded at `max_neighbours` entries and never contains the node's
/// own endpoint. Peers that fail `PEER_FAILURE_THRESHOLD` consecutive
/// requests (gossip, consensus, or diffusion alike) are pruned — a
/// deliberate departure from the reference implementation, whose
/// gossip task carries a `# TODO: Delete not accessible neighbours`
/// that was never acted on.
#[derive(Clone, Debug)]
pub struct PeerSet {
    self_endpoint: PeerEndpoint,
    max_neighbours: usize,
    peers: HashSet<PeerEndpoint>,
    failures: HashMap<PeerEndpoint, u32>,
}

impl PeerSet {
    pub fn new(self_endpoint: PeerEndpoint, max_neighbours: usize) -> Self {
        Self {
            self_endpoint,
            max_neighbours,
            peers: HashSet::new(),
            failures: HashMap::new(),
        }
    }

    /// Attempts to add `candidate` to the set. Returns `true` if it was
    /// inserted: it is rejected if it is our own endpoint, already
    /// known, or the set is already full.
    pub fn try_insert(&mut self, candidate: PeerEndpoint) -> bool {
        if candidate == self.self_endpoint {
            return false;
        }
        if self.peers.len() >= self.max_neighbours {
            return false;
        }
        self.peers.insert(candidate)
    }

    /// Records a failed request to `peer`. Returns `true` if this
    /// failure caused the peer to be pruned.
    pub fn record_failure(&mut self, peer: &PeerEndpoint) -> bool {
        let count = self.failures.entry(peer.clone()).or_insert(0);
        *count += 1;
        if *count >= crate::config::PEER_FAILURE_THRESHOLD {
            self.peers.remove(peer);
            self.failures.remove(peer);
            true
        } else {
            false
        }
    }

    pub fn record_success(&mut self, peer: &PeerEndpoint) {
        self.failures.remove(peer);
    }

    pub fn snapshot(&self) -> Vec<PeerEndpoint> {
        self.peers.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.peers.len() >= self.max_neighbours
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(port: u16) -> PeerEndpoint {
        PeerEndpoint::new("127.0.0.1", port).unwrap()
    }

    #[test]
    fn localhost_and_0_0_0_0_canonicalize_to_loopback() {
        assert_eq!(PeerEndpoint::new("localhost", 1).unwrap().host(), "127.0.0.1");
        assert_eq!(PeerEndpoint::new("0.0.0.0", 1).unwrap().host(), "127.0.0.1");
    }

    #[test]
    fn port_zero_is_rejected() {
        assert!(PeerEndpoint::new("127.0.0.1", 0).is_err());
    }

    #[test]
    fn from_str_round_trips_with_display() {
        let e = endpoint(9000);
        let parsed: PeerEndpoint = e.to_string().parse().unwrap();
        assert_eq!(e, parsed);
    }

    #[test]
    fn peer_set_rejects_self() {
        let me = endpoint(12345);
        let mut set = PeerSet::new(me.clone(), 3);
        assert!(!set.try_insert(me));
        assert!(set.is_empty());
    }

    #[test]
    fn peer_set_is_bounded() {
        let mut set = PeerSet::new(endpoint(1), 2);
        assert!(set.try_insert(endpoint(2)));
        assert!(set.try_insert(endpoint(3)));
        assert!(!set.try_insert(endpoint(4)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn peer_is_pruned_after_threshold_failures() {
        let mut set = PeerSet::new(endpoint(1), 3);
        let peer = endpoint(2);
        set.try_insert(peer.clone());

        for _ in 0..crate::config::PEER_FAILURE_THRESHOLD - 1 {
            assert!(!set.record_failure(&peer));
        }
        assert!(set.record_failure(&peer));
        assert!(set.is_empty());
    }

    #[test]
    fn success_resets_failure_count() {
        let mut set = PeerSet::new(endpoint(1), 3);
        let peer = endpoint(2);
        set.try_insert(peer.clone());

        set.record_failure(&peer);
        set.record_success(&peer);
        for _ in 0..crate::config::PEER_FAILURE_THRESHOLD - 1 {
            assert!(!set.record_failure(&peer));
        }
        assert_eq!(set.len(), 1);
    }
}
