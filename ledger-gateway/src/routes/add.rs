use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::state::SharedState;

#[derive(Deserialize)]
pub struct AddQuery {
    message: Option<String>,
}

#[derive(Serialize)]
pub struct AddResponse {
    message: String,
    more_information: &'static str,
}

#[derive(Serialize)]
pub struct AddError {
    error: String,
}

/// `PUT /add?message=...`
///
/// Submits a new message to the mempool. `message` must be present and
/// non-empty; the coordinator assigns it an id and mines it into a
/// future block.
pub async fn add(
    State(state): State<SharedState>,
    Query(query): Query<AddQuery>,
) -> (StatusCode, Json<serde_json::Value>) {
    let text = match query.message.filter(|m| !m.is_empty()) {
        Some(text) => text,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(
                    serde_json::to_value(AddError {
                        error: "query parameter 'message' is required and must not be empty".to_string(),
                    })
                    .expect("AddError always serializes"),
                ),
            );
        }
    };

    match state.coordinator.submit_message(text).await {
        Ok(envelope) => {
            tracing::debug!(id = %envelope.id(), "message accepted into mempool");
            (
                StatusCode::OK,
                Json(
                    serde_json::to_value(AddResponse {
                        message: envelope.text().to_string(),
                        more_information: "message accepted, will be added to the chain shortly",
                    })
                    .expect("AddResponse always serializes"),
                ),
            )
        }
        Err(error) => {
            tracing::warn!(%error, "rejected message submission");
            (
                StatusCode::BAD_REQUEST,
                Json(
                    serde_json::to_value(AddError { error: error.to_string() })
                        .expect("AddError always serializes"),
                ),
            )
        }
    }
}
