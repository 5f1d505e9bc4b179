use axum::extract::State;
use axum::Json;
use ledger::Envelope;

use crate::state::SharedState;

/// `GET /data`
///
/// Returns the node's current mempool. Peers use this endpoint during
/// diffusion to pick up messages they haven't seen yet.
pub async fn data(State(state): State<SharedState>) -> Json<Vec<Envelope>> {
    Json(state.coordinator.snapshot_mempool().await.unwrap_or_default())
}
