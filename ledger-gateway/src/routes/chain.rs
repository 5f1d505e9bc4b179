use axum::extract::State;
use axum::Json;
use ledger::Block;
use serde::Serialize;

use crate::state::SharedState;

#[derive(Serialize)]
pub struct ChainResponse {
    chain: Vec<Block>,
    length: usize,
}

/// `GET /chain`
///
/// Returns the node's current view of the chain. Peers use this
/// endpoint during consensus to discover and adopt longer valid
/// chains.
pub async fn chain(State(state): State<SharedState>) -> Json<ChainResponse> {
    let chain = state
        .coordinator
        .snapshot_chain()
        .await
        .unwrap_or_default();
    let length = chain.len();
    Json(ChainResponse { chain, length })
}
