//! The node coordinator: the single task that owns the chain, mempool,
//! and peer set, and the typed request/reply protocol everything else
//! talks to it through.
//!
//! The reference implementation runs its HTTP server in a forked OS
//! process and has it write into shared state protected by process-
//! level locks. A single in-process event loop reached over channels
//! gets the same single-writer guarantee without the IPC overhead, and
//! is the natural shape for an async Rust node: the ingress HTTP
//! handlers and the periodic background tasks all become clients of
//! the same mailbox.

mod engine;
mod mining;

use tokio::sync::{mpsc, oneshot};

use crate::errors::CoordinatorError;
use crate::peers::PeerEndpoint;
use crate::types::{Block, Envelope};

pub use engine::Coordinator;

const INBOX_CAPACITY: usize = 256;

/// A request the coordinator can be asked to handle, each paired with
/// a one-shot reply channel.
pub enum Request {
    SubmitMessage {
        text: String,
        reply: oneshot::Sender<Result<Envelope, CoordinatorError>>,
    },
    SnapshotChain {
        reply: oneshot::Sender<Vec<Block>>,
    },
    SnapshotPeers {
        reply: oneshot::Sender<Vec<PeerEndpoint>>,
    },
    SnapshotMempool {
        reply: oneshot::Sender<Vec<Envelope>>,
    },
}

/// A cheaply cloneable handle to a running coordinator.
///
/// This is what the ingress HTTP server (and anything else embedding
/// the node) holds; it never touches the chain, mempool, or peer set
/// directly.
#[derive(Clone)]
pub struct CoordinatorHandle {
    sender: mpsc::Sender<Request>,
}

impl CoordinatorHandle {
    pub async fn submit_message(&self, text: String) -> Result<Envelope, CoordinatorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Request::SubmitMessage { text, reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| CoordinatorError::ShuttingDown)?
    }

    pub async fn snapshot_chain(&self) -> Result<Vec<Block>, CoordinatorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Request::SnapshotChain { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| CoordinatorError::ShuttingDown)
    }

    pub async fn snapshot_peers(&self) -> Result<Vec<PeerEndpoint>, CoordinatorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Request::SnapshotPeers { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| CoordinatorError::ShuttingDown)
    }

    pub async fn snapshot_mempool(&self) -> Result<Vec<Envelope>, CoordinatorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Request::SnapshotMempool { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| CoordinatorError::ShuttingDown)
    }

    async fn send(&self, request: Request) -> Result<(), CoordinatorError> {
        self.sender
            .send(request)
            .await
            .map_err(|_| CoordinatorError::ShuttingDown)
    }
}

fn channel() -> (mpsc::Sender<Request>, mpsc::Receiver<Request>) {
    mpsc::channel(INBOX_CAPACITY)
}
