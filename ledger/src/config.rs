//! Node configuration and the compile-time constants that parameterize
//! the periodic tasks and peer set.
//!
//! This mirrors the teacher's `ChainConfig` aggregation pattern: a single
//! struct that higher-level binaries construct from CLI flags, with the
//! genuinely protocol-level knobs (neighbour bound, task intervals) kept
//! as constants rather than per-node configuration, per the design doc.

use std::path::PathBuf;
use std::time::Duration;

use crate::peers::PeerEndpoint;

/// Maximum number of peers a node will track at once.
pub const MAX_NEIGHBOURS: usize = 3;

/// Number of consecutive unreachable gossip/consensus/diffusion results
/// before a peer is pruned from the peer set.
///
/// The reference implementation never prunes peers at all (its gossip
/// task has a `# TODO: Delete not accessible neighbours`); this node
/// does, per the design doc's redesign decision.
pub const PEER_FAILURE_THRESHOLD: u32 = 5;

/// Default proof-of-work difficulty (trailing zero hex characters).
pub const DEFAULT_DIFFICULTY: u32 = 5;

/// Default gossip task interval.
pub const GOSSIP_INTERVAL: Duration = Duration::from_secs(20);
/// Default chain consensus task interval.
pub const CONSENSUS_INTERVAL: Duration = Duration::from_secs(10);
/// Default mempool diffusion task interval.
pub const DIFFUSION_INTERVAL: Duration = Duration::from_secs(5);
/// Default chain backup/persistence task interval.
pub const BACKUP_INTERVAL: Duration = Duration::from_secs(30);

/// Timeout applied to every outbound peer HTTP call.
pub const PEER_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Number of proof-of-work candidates tried between cooperative yields,
/// so the periodic tasks get a chance to run while mining is in
/// progress.
pub const MINING_YIELD_INTERVAL: u64 = 2048;

/// How often the mining loop polls the mempool when it finds it empty.
pub const MINING_IDLE_POLL: Duration = Duration::from_millis(200);

/// On-disk serialization format for the chain file, fixed at node
/// construction and recorded alongside the rest of the configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainFormat {
    Json,
    Binary,
}

/// Top-level node configuration, analogous to the teacher's
/// `ChainConfig`: aggregates everything a binary needs to construct a
/// running node.
#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// Filesystem path to the chain file (its `.hash` companion lives
    /// alongside it with the same stem).
    pub chain_path: PathBuf,
    /// Serialization format used for `chain_path`.
    pub format: ChainFormat,
    /// Port the ingress HTTP server listens on.
    pub listen_port: u16,
    /// Proof-of-work difficulty (trailing zero hex chars required).
    pub difficulty: u32,
    /// Seed peers supplied at start-up.
    pub seed_peers: Vec<PeerEndpoint>,
    /// If true and a chain file already exists, rotate it aside and
    /// start from a fresh genesis-only chain instead of loading it.
    pub force_new_chain: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            chain_path: PathBuf::from("data/chain.json"),
            format: ChainFormat::Json,
            listen_port: 12345,
            difficulty: DEFAULT_DIFFICULTY,
            seed_peers: Vec::new(),
            force_new_chain: false,
        }
    }
}
