//! HTTP ingress for a ledger node: a thin Axum layer over a
//! [`ledger::CoordinatorHandle`].
//!
//! Every handler here does one of two things: forward a request to the
//! coordinator's mailbox and wait for its reply, or reject the request
//! outright (a missing `message` query parameter, an unknown route).
//! None of them touch the chain, mempool, or peer set directly.

mod routes;
mod state;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::Json;
use axum::Router;
use ledger::CoordinatorHandle;
use serde::Serialize;

pub use state::{AppState, SharedState};

/// Builds the node's HTTP router: `/health`, `PUT /add`, `GET /chain`,
/// `GET /neighbours`, `GET /data`, with an unmatched-route fallback
/// that returns a plain 404.
pub fn router(coordinator: CoordinatorHandle) -> Router {
    let state: SharedState = Arc::new(AppState { coordinator });

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/add", put(routes::add::add))
        .route("/chain", get(routes::chain::chain))
        .route("/neighbours", get(routes::neighbours::neighbours))
        .route("/data", get(routes::data::data))
        .fallback(not_found)
        .with_state(state)
}

#[derive(Serialize)]
struct NotFoundResponse {
    message: &'static str,
}

async fn not_found(uri: axum::http::Uri) -> (StatusCode, Json<NotFoundResponse>) {
    tracing::warn!(path = %uri.path(), "unmatched ingress route");
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse {
            message: "not found",
        }),
    )
}
