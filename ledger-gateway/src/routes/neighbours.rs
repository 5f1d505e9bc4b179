use axum::extract::State;
use axum::Json;
use ledger::PeerEndpoint;
use serde::Serialize;

use crate::state::SharedState;

#[derive(Serialize)]
pub struct NeighboursResponse {
    neighbours: Vec<PeerEndpoint>,
    length: usize,
}

/// `GET /neighbours`
///
/// Returns the node's current peer set. Peers use this endpoint during
/// gossip to discover new neighbours transitively.
pub async fn neighbours(State(state): State<SharedState>) -> Json<NeighboursResponse> {
    let neighbours = state
        .coordinator
        .snapshot_peers()
        .await
        .unwrap_or_default();
    let length = neighbours.len();
    Json(NeighboursResponse { neighbours, length })
}
