//! Outbound HTTP calls to peers: the client side of gossip, chain
//! consensus, and mempool diffusion.

use serde::{Deserialize, Serialize};

use crate::errors::PeerError;
use crate::peers::PeerEndpoint;
use crate::types::{Block, Envelope};

/// Wire shape of a peer's `GET /chain` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChainResponse {
    pub chain: Vec<Block>,
    pub length: usize,
}

/// Wire shape of a peer's `GET /neighbours` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct NeighboursResponse {
    pub neighbours: Vec<PeerEndpoint>,
    pub length: usize,
}

pub async fn fetch_chain(client: &reqwest::Client, peer: &PeerEndpoint) -> Result<ChainResponse, PeerError> {
    let url = format!("{}/chain", peer.base_url());
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| PeerError::Unreachable(peer.to_string(), e.to_string()))?;

    response
        .json::<ChainResponse>()
        .await
        .map_err(|e| PeerError::Protocol(peer.to_string(), e.to_string()))
}

pub async fn fetch_neighbours(
    client: &reqwest::Client,
    peer: &PeerEndpoint,
) -> Result<NeighboursResponse, PeerError> {
    let url = format!("{}/neighbours", peer.base_url());
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| PeerError::Unreachable(peer.to_string(), e.to_string()))?;

    response
        .json::<NeighboursResponse>()
        .await
        .map_err(|e| PeerError::Protocol(peer.to_string(), e.to_string()))
}

pub async fn fetch_mempool(
    client: &reqwest::Client,
    peer: &PeerEndpoint,
) -> Result<Vec<Envelope>, PeerError> {
    let url = format!("{}/data", peer.base_url());
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| PeerError::Unreachable(peer.to_string(), e.to_string()))?;

    response
        .json::<Vec<Envelope>>()
        .await
        .map_err(|e| PeerError::Protocol(peer.to_string(), e.to_string()))
}

/// Builds the shared HTTP client used for every outbound peer call,
/// with a bounded timeout so an unreachable peer cannot stall a
/// periodic task indefinitely.
pub fn client(timeout: std::time::Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("reqwest client configuration is always valid")
}
