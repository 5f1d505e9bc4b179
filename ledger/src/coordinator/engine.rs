use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{
    NodeConfig, BACKUP_INTERVAL, CONSENSUS_INTERVAL, DIFFUSION_INTERVAL, GOSSIP_INTERVAL,
    MINING_IDLE_POLL, PEER_REQUEST_TIMEOUT,
};
use crate::errors::{CoordinatorError, StoreError};
use crate::mempool::Mempool;
use crate::network;
use crate::peers::{PeerEndpoint, PeerSet};
use crate::store::ChainStore;
use crate::types::{Block, Envelope, ProofValue};
use crate::validator;

use super::mining::{MiningAttempt, StepOutcome};
use super::{channel, CoordinatorHandle, Request};

/// The running node: chain, mempool, peer set, and the tasks that keep
/// them in sync with the rest of the network.
///
/// Everything here is only ever touched from [`Coordinator::run`]'s
/// event loop; there is no internal locking because there is no
/// concurrent access to guard against.
pub struct Coordinator {
    store: ChainStore,
    mempool: Mempool,
    peers: PeerSet,
    config: NodeConfig,
    http: reqwest::Client,
}

impl Coordinator {
    /// Opens the chain file and builds a coordinator, returning its
    /// handle and the future that drives it. The caller is responsible
    /// for spawning the returned future (typically with `tokio::spawn`)
    /// and for sending on `shutdown` to stop it gracefully.
    pub fn spawn(
        self_endpoint: PeerEndpoint,
        config: NodeConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(CoordinatorHandle, tokio::task::JoinHandle<()>), StoreError> {
        let store = ChainStore::open(&config)?;
        let mut peers = PeerSet::new(self_endpoint, crate::config::MAX_NEIGHBOURS);
        for seed in &config.seed_peers {
            peers.try_insert(seed.clone());
        }

        let coordinator = Coordinator {
            store,
            mempool: Mempool::new(),
            peers,
            http: network::client(PEER_REQUEST_TIMEOUT),
            config,
        };

        let (sender, receiver) = channel();
        let handle = CoordinatorHandle { sender };
        let join = tokio::spawn(coordinator.run(receiver, shutdown));
        Ok((handle, join))
    }

    async fn run(mut self, mut inbox: mpsc::Receiver<Request>, mut shutdown: broadcast::Receiver<()>) {
        let mut gossip_timer = interval(GOSSIP_INTERVAL);
        let mut consensus_timer = interval(CONSENSUS_INTERVAL);
        let mut diffusion_timer = interval(DIFFUSION_INTERVAL);
        let mut backup_timer = interval(BACKUP_INTERVAL);
        for timer in [&mut gossip_timer, &mut consensus_timer, &mut diffusion_timer, &mut backup_timer] {
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }

        let mut mining_attempt: Option<MiningAttempt> = None;

        info!(port = self.config.listen_port, difficulty = self.config.difficulty, "coordinator started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.recv() => {
                    info!("coordinator received shutdown signal");
                    break;
                }

                Some(request) = inbox.recv() => {
                    self.handle_request(request);
                }

                _ = gossip_timer.tick() => {
                    self.run_gossip().await;
                }

                _ = consensus_timer.tick() => {
                    self.run_consensus().await;
                }

                _ = diffusion_timer.tick() => {
                    self.run_diffusion().await;
                }

                _ = backup_timer.tick() => {
                    self.run_backup();
                }

                _ = self.mine_step(&mut mining_attempt) => {}
            }
        }

        self.run_backup();
        info!("coordinator stopped");
    }

    fn handle_request(&mut self, request: Request) {
        match request {
            Request::SubmitMessage { text, reply } => {
                let outcome = Envelope::new(text)
                    .map_err(CoordinatorError::from)
                    .map(|envelope| {
                        self.mempool.insert(envelope.clone());
                        envelope
                    });
                let _ = reply.send(outcome);
            }
            Request::SnapshotChain { reply } => {
                let _ = reply.send(self.store.snapshot());
            }
            Request::SnapshotPeers { reply } => {
                let _ = reply.send(self.peers.snapshot());
            }
            Request::SnapshotMempool { reply } => {
                let _ = reply.send(self.mempool.snapshot());
            }
        }
    }

    /// Advances the in-progress mining attempt by one bounded batch of
    /// candidates, starting a new attempt from the mempool if none is
    /// running, or sleeping briefly if the mempool is empty. Yields to
    /// the runtime between batches so the other branches of the select
    /// loop above get a turn.
    async fn mine_step(&mut self, attempt: &mut Option<MiningAttempt>) {
        while attempt.is_none() {
            match self.mempool.take_one() {
                Some(envelope) => {
                    if self.store.blocks().iter().any(|b| b.data.id() == envelope.id()) {
                        debug!(id = %envelope.id(), "mempool envelope already on chain, discarding");
                        continue;
                    }
                    *attempt = Some(MiningAttempt::start(envelope, self.store.tip(), self.config.difficulty));
                }
                None => {
                    tokio::time::sleep(MINING_IDLE_POLL).await;
                    return;
                }
            }
        }

        let outcome = attempt.as_mut().expect("just ensured an attempt exists").step();
        match outcome {
            StepOutcome::InProgress => {
                tokio::task::yield_now().await;
            }
            StepOutcome::Found(block) => {
                let envelope_id = block.data.id().to_string();
                let finished = attempt.take().expect("outcome came from this attempt");
                match self.store.try_append(block) {
                    Ok(true) => {
                        debug!(id = %envelope_id, index = self.store.tip().index, "mined block");
                    }
                    Ok(false) => {
                        debug!(id = %envelope_id, "mined block discarded, chain moved on; requeuing message");
                        self.mempool.requeue(finished.envelope().clone());
                    }
                    Err(error) => {
                        warn!(%error, "failed to persist mined block");
                        self.mempool.requeue(finished.envelope().clone());
                    }
                }
            }
        }
    }

    /// Asks each known peer for its neighbours and tries to adopt any
    /// new ones, up to the bounded peer set's capacity.
    async fn run_gossip(&mut self) {
        if self.peers.is_empty() {
            return;
        }

        for peer in self.peers.snapshot() {
            if self.peers.is_full() {
                break;
            }
            match network::fetch_neighbours(&self.http, &peer).await {
                Ok(response) => {
                    self.peers.record_success(&peer);
                    for candidate in response.neighbours {
                        self.peers.try_insert(candidate);
                    }
                }
                Err(error) => {
                    warn!(peer = %peer, %error, "gossip request failed");
                    if self.peers.record_failure(&peer) {
                        warn!(peer = %peer, "peer pruned after repeated failures");
                    }
                }
            }
        }
    }

    /// Fetches each peer's chain and adopts the longest one that is
    /// both longer than ours and independently valid, replaying any
    /// messages orphaned by the switch back into the mempool.
    async fn run_consensus(&mut self) {
        let mut best: Option<Vec<Block>> = None;

        for peer in self.peers.snapshot() {
            match network::fetch_chain(&self.http, &peer).await {
                Ok(response) => {
                    self.peers.record_success(&peer);
                    let is_longer = response.chain.len() > self.store.len()
                        && best.as_ref().is_none_or(|b| response.chain.len() > b.len());
                    if is_longer && validator::is_chain_valid(&response.chain, self.config.difficulty) {
                        best = Some(response.chain);
                    }
                }
                Err(error) => {
                    warn!(peer = %peer, %error, "consensus request failed");
                    if self.peers.record_failure(&peer) {
                        warn!(peer = %peer, "peer pruned after repeated failures");
                    }
                }
            }
        }

        if let Some(chain) = best {
            let adopted_len = chain.len();
            let orphaned = self.store.replace(chain);
            if !orphaned.is_empty() {
                debug!(count = orphaned.len(), "replaying messages orphaned by reorg");
            }
            self.mempool.replay(orphaned.into_iter().map(|b| b.data));
            info!(length = adopted_len, "adopted longer chain from a peer");
        }
    }

    /// Pulls each peer's mempool and merges in anything we don't
    /// already have pending or already mined.
    async fn run_diffusion(&mut self) {
        for peer in self.peers.snapshot() {
            match network::fetch_mempool(&self.http, &peer).await {
                Ok(envelopes) => {
                    self.peers.record_success(&peer);
                    for envelope in envelopes {
                        if !self.already_processed(envelope.id()) {
                            self.mempool.insert(envelope);
                        }
                    }
                }
                Err(error) => {
                    warn!(peer = %peer, %error, "diffusion request failed");
                    if self.peers.record_failure(&peer) {
                        warn!(peer = %peer, "peer pruned after repeated failures");
                    }
                }
            }
        }
    }

    fn already_processed(&self, id: &str) -> bool {
        self.mempool.contains(id) || self.store.blocks().iter().any(|b| b.data.id() == id)
    }

    /// Persists the chain only if it would actually change the on-disk
    /// bytes, so an idle node isn't rotating and rewriting an unchanged
    /// chain file every tick.
    fn run_backup(&self) {
        match self.store.needs_backup() {
            Ok(false) => {}
            Ok(true) => {
                if let Err(error) = self.store.save() {
                    warn!(%error, "failed to persist chain backup");
                }
            }
            Err(error) => {
                warn!(%error, "failed to check whether chain backup is needed");
                if let Err(error) = self.store.save() {
                    warn!(%error, "failed to persist chain backup");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast;

    fn endpoint(port: u16) -> PeerEndpoint {
        PeerEndpoint::new("127.0.0.1", port).unwrap()
    }

    #[tokio::test]
    async fn submit_message_lands_in_the_mempool() {
        let dir = tempfile::tempdir().unwrap();
        let config = NodeConfig {
            chain_path: dir.path().join("chain.json"),
            difficulty: 1,
            listen_port: 9001,
            ..NodeConfig::default()
        };
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (handle, join) = Coordinator::spawn(endpoint(9001), config, shutdown_rx).unwrap();

        let envelope = handle.submit_message("hello".to_string()).await.unwrap();
        assert_eq!(envelope.text(), "hello");

        // Give the mining loop a moment to at least observe the mempool.
        tokio::time::sleep(Duration::from_millis(50)).await;

        join.abort();
    }

    #[tokio::test]
    async fn submitted_message_eventually_reaches_the_chain() {
        let dir = tempfile::tempdir().unwrap();
        let config = NodeConfig {
            chain_path: dir.path().join("chain.json"),
            difficulty: 1,
            listen_port: 9002,
            ..NodeConfig::default()
        };
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (handle, join) = Coordinator::spawn(endpoint(9002), config, shutdown_rx).unwrap();

        handle.submit_message("mine me".to_string()).await.unwrap();

        let mined = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let chain = handle.snapshot_chain().await.unwrap();
                if chain.len() > 1 {
                    return chain;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("block should be mined within the timeout at difficulty 1");

        assert_eq!(mined.last().unwrap().data.text(), "mine me");
        join.abort();
    }

    #[tokio::test]
    async fn mempool_envelope_already_on_chain_is_discarded_without_remining() {
        let dir = tempfile::tempdir().unwrap();
        let config = NodeConfig {
            chain_path: dir.path().join("chain.json"),
            difficulty: 1,
            listen_port: 9003,
            ..NodeConfig::default()
        };
        let mut store = ChainStore::open(&config).unwrap();

        let envelope = Envelope::from_parts("already-mined", "seen before");
        let block = Block {
            index: 1,
            timestamp: store.tip().timestamp + chrono::Duration::seconds(1),
            data: envelope.clone(),
            proof: ProofValue::Value(1),
            previous_hash: validator::hash(store.tip()),
        };
        assert!(store.try_append(block).unwrap());

        let mut coordinator = Coordinator {
            peers: PeerSet::new(endpoint(9003), crate::config::MAX_NEIGHBOURS),
            mempool: Mempool::new(),
            http: network::client(PEER_REQUEST_TIMEOUT),
            store,
            config,
        };
        coordinator.mempool.insert(envelope);

        let mut attempt: Option<MiningAttempt> = None;
        coordinator.mine_step(&mut attempt).await;

        assert!(attempt.is_none());
        assert!(coordinator.mempool.is_empty());
        assert_eq!(coordinator.store.len(), 2);
    }
}
