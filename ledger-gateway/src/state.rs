//! Shared application state handed to every route handler.

use std::sync::Arc;

use ledger::CoordinatorHandle;

/// Everything a route handler needs: a handle to the coordinator
/// mailbox. Handlers never touch the chain, mempool, or peer set
/// directly.
pub struct AppState {
    pub coordinator: CoordinatorHandle,
}

/// Thread-safe alias for [`AppState`], the shape Axum's `State`
/// extractor expects.
pub type SharedState = Arc<AppState>;
